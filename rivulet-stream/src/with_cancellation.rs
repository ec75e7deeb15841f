// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::future::Future;
use futures::stream::{BoxStream, StreamExt};
use futures::Stream;
use rivulet_core::{CancellationToken, CancelledOwned, RivuletError, StreamItem};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream ending with [`RivuletError::Cancelled`] once its token fires.
///
/// The token is checked before every pull, so an item the upstream has ready is
/// not delivered after cancellation. The upstream is dropped as soon as the
/// cancellation is observed.
pub struct WithCancellation<T> {
    upstream: Option<BoxStream<'static, StreamItem<T>>>,
    cancelled: CancelledOwned,
}

impl<T> Stream for WithCancellation<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        if Pin::new(&mut this.cancelled).poll(cx).is_ready() {
            this.upstream = None;
            debug!("stream cancelled, upstream dropped");
            return Poll::Ready(Some(StreamItem::Error(RivuletError::Cancelled)));
        }

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(StreamItem::Error(error))) => {
                this.upstream = None;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            Poll::Ready(None) => {
                this.upstream = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

pub trait WithCancellationExt<T>: Stream<Item = StreamItem<T>> + Sized {
    fn with_cancellation(self, token: CancellationToken) -> WithCancellation<T>
    where
        Self: Send + 'static,
    {
        WithCancellation {
            upstream: Some(self.boxed()),
            cancelled: token.cancelled_owned(),
        }
    }
}

impl<S, T> WithCancellationExt<T> for S where S: Stream<Item = StreamItem<T>> {}
