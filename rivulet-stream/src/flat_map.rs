// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bounded-concurrency flattening without ordering across inner streams.
//!
//! Each upstream value is mapped to an inner stream behind its own read-ahead
//! window. At most `max_concurrency` inner streams run at once; a permit is taken
//! before an upstream value is pulled and returned when its inner stream ends.
//! Inner failures are aggregated the way [`rivulet_merge::merge_concurrently`]
//! does: every running stream finishes before the output fails.

use crate::prefetch::{Prefetch, PrefetchConfig};
use futures::future::Future;
use futures::stream::{self, StreamExt};
use futures::Stream;
use rivulet_core::{RivuletError, StreamItem};
use rivulet_merge::{merge_with_options, MergeOptions, MergedStream};
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatMapConfig {
    /// Inner streams running at once. `usize::MAX` is unbounded.
    pub max_concurrency: usize,
    /// Read-ahead window of every inner stream.
    pub prefetch: usize,
}

impl FlatMapConfig {
    #[must_use]
    pub fn new(max_concurrency: usize, prefetch: usize) -> Self {
        Self {
            max_concurrency,
            prefetch,
        }
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    #[must_use]
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch;
        self
    }

    pub(crate) fn validate(&self) -> rivulet_core::Result<()> {
        if self.max_concurrency == 0 {
            return Err(RivuletError::invalid_state("max_concurrency must be positive"));
        }
        PrefetchConfig::new(self.prefetch).validate()
    }
}

impl Default for FlatMapConfig {
    fn default() -> Self {
        Self::new(usize::MAX, 32)
    }
}

/// Output of [`FlatMapExt::flat_map`] and [`FlatMapExt::for_each_concurrently`].
pub struct FlatMap<U> {
    state: FlatMapState<U>,
}

enum FlatMapState<U> {
    Merging(MergedStream<U>),
    Rejected(Option<RivuletError>),
}

impl<U> FlatMap<U> {
    pub(crate) fn rejected(error: RivuletError) -> Self {
        Self {
            state: FlatMapState::Rejected(Some(error)),
        }
    }
}

impl<U> Stream for FlatMap<U> {
    type Item = StreamItem<U>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.state {
            FlatMapState::Merging(merged) => merged.poll_next_unpin(cx),
            FlatMapState::Rejected(error) => Poll::Ready(error.take().map(StreamItem::Error)),
        }
    }
}

pub trait FlatMapExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Maps every value to an inner stream and merges the inner streams.
    ///
    /// A zero `max_concurrency` or `prefetch` fails the output with
    /// [`RivuletError::InvalidState`].
    ///
    /// With `futures::StreamExt` in scope, call it as `FlatMapExt::flat_map(stream, ..)`.
    fn flat_map<U, I, F>(self, mut mapper: F, config: FlatMapConfig) -> FlatMap<U>
    where
        Self: Send + 'static,
        T: Send + 'static,
        U: Send + 'static,
        I: Stream<Item = StreamItem<U>> + Send + 'static,
        F: FnMut(T) -> I + Send + 'static,
    {
        if let Err(error) = config.validate() {
            return FlatMap::rejected(error);
        }

        let window = PrefetchConfig::new(config.prefetch);
        let sources = self.map(move |item| item.map(|value| Prefetch::new(mapper(value), window)));

        let mut options = MergeOptions::aggregate().with_output_capacity(config.prefetch);
        if config.max_concurrency != usize::MAX {
            options = options.with_max_concurrency(config.max_concurrency);
        }

        FlatMap {
            state: FlatMapState::Merging(merge_with_options(sources, options)),
        }
    }

    /// Runs `function` for up to `max_concurrency` values at a time, emitting
    /// each result as soon as it is ready.
    ///
    /// A failed call is aggregated like a failed inner stream of
    /// [`flat_map`](Self::flat_map).
    fn for_each_concurrently<U, F, Fut>(self, max_concurrency: usize, mut function: F) -> FlatMap<U>
    where
        Self: Send + 'static,
        T: Send + 'static,
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = rivulet_core::Result<U>> + Send + 'static,
    {
        FlatMapExt::flat_map(
            self,
            move |value| stream::once(function(value)).map(StreamItem::from),
            FlatMapConfig::new(max_concurrency, 1),
        )
    }
}

impl<S, T> FlatMapExt<T> for S where S: Stream<Item = StreamItem<T>> {}
