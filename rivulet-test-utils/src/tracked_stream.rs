// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Shared view of what happened to one or more [`TrackedStream`]s.
#[derive(Clone, Debug, Default)]
pub struct DisposeTracker {
    opened: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
    polled: Arc<AtomicUsize>,
}

impl DisposeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps `inner` so that its first poll and its drop are recorded here.
    pub fn track<S>(&self, inner: S) -> TrackedStream<S> {
        TrackedStream {
            inner: Box::pin(inner),
            tracker: self.clone(),
            started: false,
        }
    }

    /// Streams polled at least once.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Total number of polls across tracked streams.
    pub fn polls(&self) -> usize {
        self.polled.load(Ordering::SeqCst)
    }
}

/// A stream reporting its first poll and its drop to a [`DisposeTracker`].
pub struct TrackedStream<S> {
    inner: Pin<Box<S>>,
    tracker: DisposeTracker,
    started: bool,
}

impl<S: Stream> Stream for TrackedStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.started {
            self.started = true;
            self.tracker.opened.fetch_add(1, Ordering::SeqCst);
        }
        self.tracker.polled.fetch_add(1, Ordering::SeqCst);
        self.inner.as_mut().poll_next(cx)
    }
}

impl<S> Drop for TrackedStream<S> {
    fn drop(&mut self) {
        self.tracker.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
