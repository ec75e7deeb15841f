// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cleanup action bound to the lifetime of a stream.
//!
//! The handler runs exactly once, after the upstream has been dropped:
//!
//! - at the upstream's end, where a failing handler becomes a trailing error;
//! - at an upstream error, where a failing handler is aggregated with it (nested
//!   `do_on_dispose` failures arrive as that upstream error and are flattened
//!   into the same aggregate);
//! - when the stream is dropped early, where a failure can only be logged.
//!
//! A handler returning [`RivuletError::Cancelled`] is treated as success, and an
//! upstream cancellation is never aggregated with a handler failure.

use futures::stream::{BoxStream, StreamExt};
use futures::Stream;
use rivulet_core::{RivuletError, StreamItem};
use std::pin::Pin;
use std::task::{Context, Poll};

pub struct DoOnDispose<T, F>
where
    F: FnOnce() -> rivulet_core::Result<()>,
{
    upstream: Option<BoxStream<'static, StreamItem<T>>>,
    handler: Option<F>,
}

impl<T, F> DoOnDispose<T, F>
where
    F: FnOnce() -> rivulet_core::Result<()>,
{
    fn dispose(&mut self) -> Option<RivuletError> {
        self.upstream = None;
        let handler = self.handler.take()?;
        match handler() {
            Ok(()) => None,
            Err(error) if error.is_cancelled() => None,
            Err(error) => Some(error),
        }
    }
}

impl<T, F> Stream for DoOnDispose<T, F>
where
    F: FnOnce() -> rivulet_core::Result<()> + Unpin,
{
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(StreamItem::Value(value))) => {
                Poll::Ready(Some(StreamItem::Value(value)))
            }
            Poll::Ready(Some(StreamItem::Error(error))) => {
                let failure = match this.dispose() {
                    Some(handler_error) if error.is_cancelled() => {
                        warn!("dispose handler failed after cancellation: {handler_error}");
                        error
                    }
                    Some(handler_error) => RivuletError::aggregate(vec![error, handler_error]),
                    None => error,
                };
                Poll::Ready(Some(StreamItem::Error(failure)))
            }
            Poll::Ready(None) => Poll::Ready(this.dispose().map(StreamItem::Error)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, F> Drop for DoOnDispose<T, F>
where
    F: FnOnce() -> rivulet_core::Result<()>,
{
    fn drop(&mut self) {
        if let Some(error) = self.dispose() {
            warn!("dispose handler failed after the consumer left: {error}");
        }
    }
}

pub trait DoOnDisposeExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Runs `handler` once when this stream terminates or is dropped.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::{RivuletError, StreamItem};
    /// use rivulet_stream::DoOnDisposeExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let items: Vec<_> = futures::stream::iter(vec![StreamItem::Value(1)])
    ///     .do_on_dispose(|| Err(RivuletError::stream_error("cleanup failed")))
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(items.len(), 2);
    /// assert!(items[1].is_error());
    /// # }
    /// ```
    fn do_on_dispose<F>(self, handler: F) -> DoOnDispose<T, F>
    where
        Self: Send + 'static,
        F: FnOnce() -> rivulet_core::Result<()>,
    {
        DoOnDispose {
            upstream: Some(self.boxed()),
            handler: Some(handler),
        }
    }
}

impl<S, T> DoOnDisposeExt<T> for S where S: Stream<Item = StreamItem<T>> {}
