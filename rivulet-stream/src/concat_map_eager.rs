// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Ordered flattening with eager inner subscriptions.
//!
//! Up to `max_concurrency` inner streams run at once, each filling its own
//! read-ahead window, but output is taken from the oldest one only: items of a
//! later inner stream wait in its window until every earlier stream drained.
//!
//! An inner failure is emitted as soon as that stream reaches the head and ends
//! the output. An upstream failure stops new subscriptions and is emitted after
//! the inner streams already started have drained.

use crate::prefetch::{start_window, PrefetchConfig};
use futures::stream::StreamExt;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::{PermitCounter, PermitGuard, RivuletError, StreamItem, UnicastCursor};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatMapEagerConfig {
    /// Inner streams running at once.
    pub max_concurrency: usize,
    /// Read-ahead window of every inner stream.
    pub prefetch: usize,
}

impl ConcatMapEagerConfig {
    #[must_use]
    pub fn new(max_concurrency: usize, prefetch: usize) -> Self {
        Self {
            max_concurrency,
            prefetch,
        }
    }
}

impl Default for ConcatMapEagerConfig {
    fn default() -> Self {
        Self::new(32, 32)
    }
}

struct Running<U> {
    cursor: UnicastCursor<U>,
    _permit: PermitGuard,
}

#[pin_project]
pub struct ConcatMapEager<S, F, U> {
    #[pin]
    upstream: S,
    mapper: F,
    permits: PermitCounter,
    window: PrefetchConfig,
    running: VecDeque<Running<U>>,
    upstream_done: bool,
    upstream_error: Option<RivuletError>,
    rejected: Option<RivuletError>,
    terminated: bool,
}

impl<S, F, U> ConcatMapEager<S, F, U> {
    fn new(upstream: S, mapper: F, config: ConcatMapEagerConfig) -> Self {
        let window = PrefetchConfig::new(config.prefetch);
        let rejected = if config.max_concurrency == 0 {
            Some(RivuletError::invalid_state("max_concurrency must be positive"))
        } else {
            window.validate().err()
        };

        Self {
            upstream,
            mapper,
            permits: PermitCounter::new(config.max_concurrency),
            window,
            running: VecDeque::new(),
            upstream_done: false,
            upstream_error: None,
            rejected,
            terminated: false,
        }
    }
}

impl<S, F, T, I, U> Stream for ConcatMapEager<S, F, U>
where
    S: Stream<Item = StreamItem<T>>,
    F: FnMut(T) -> I,
    I: Stream<Item = StreamItem<U>> + Send + 'static,
    U: Send + 'static,
{
    type Item = StreamItem<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }
        if let Some(error) = this.rejected.take() {
            *this.terminated = true;
            return Poll::Ready(Some(StreamItem::Error(error)));
        }

        loop {
            while !*this.upstream_done {
                let Some(permit) = this.permits.try_acquire() else {
                    break;
                };
                match this.upstream.as_mut().poll_next(cx) {
                    Poll::Ready(Some(StreamItem::Value(value))) => {
                        let inner = (this.mapper)(value);
                        match start_window(inner, *this.window) {
                            Ok(cursor) => this.running.push_back(Running {
                                cursor,
                                _permit: permit,
                            }),
                            Err(error) => {
                                *this.terminated = true;
                                this.running.clear();
                                return Poll::Ready(Some(StreamItem::Error(error)));
                            }
                        }
                    }
                    Poll::Ready(Some(StreamItem::Error(error))) => {
                        *this.upstream_done = true;
                        *this.upstream_error = Some(error);
                    }
                    Poll::Ready(None) => *this.upstream_done = true,
                    Poll::Pending => break,
                }
            }

            let Some(head) = this.running.front_mut() else {
                if *this.upstream_done {
                    *this.terminated = true;
                    return Poll::Ready(this.upstream_error.take().map(StreamItem::Error));
                }
                return Poll::Pending;
            };

            match head.cursor.poll_next_unpin(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    return Poll::Ready(Some(StreamItem::Value(value)));
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    this.running.clear();
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => {
                    this.running.pop_front();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

pub trait ConcatMapEagerExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Maps every value to an inner stream and concatenates the inner streams in
    /// upstream order while running up to `max_concurrency` of them at once.
    ///
    /// A zero `max_concurrency` or `prefetch` fails the output with
    /// [`RivuletError::InvalidState`].
    fn concat_map_eager<U, I, F>(
        self,
        mapper: F,
        config: ConcatMapEagerConfig,
    ) -> ConcatMapEager<Self, F, U>
    where
        F: FnMut(T) -> I,
        I: Stream<Item = StreamItem<U>> + Send + 'static,
        U: Send + 'static,
    {
        ConcatMapEager::new(self, mapper, config)
    }
}

impl<S, T> ConcatMapEagerExt<T> for S where S: Stream<Item = StreamItem<T>> {}

type Identity<I> = fn(I) -> I;

/// Ordered flattening of a stream of streams.
pub trait ConcatEagerExt<I, U>: Stream<Item = StreamItem<I>> + Sized
where
    I: Stream<Item = StreamItem<U>> + Send + 'static,
    U: Send + 'static,
{
    fn concat_eager(self, config: ConcatMapEagerConfig) -> ConcatMapEager<Self, Identity<I>, U> {
        let identity: Identity<I> = |inner| inner;
        self.concat_map_eager(identity, config)
    }
}

impl<S, I, U> ConcatEagerExt<I, U> for S
where
    S: Stream<Item = StreamItem<I>>,
    I: Stream<Item = StreamItem<U>> + Send + 'static,
    U: Send + 'static,
{
}
