// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Flattening that follows only the newest inner stream.
//!
//! Every upstream value is mapped to an inner stream that replaces the current
//! one; the replaced stream is dropped, which disposes it. The output completes
//! once the upstream has ended and the last inner stream drained.
//!
//! An upstream failure drops the current inner stream and is forwarded at once.
//! An inner failure ends the output and disposes the upstream with it.

use futures::Stream;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use std::pin::Pin;
use std::task::{Context, Poll};

#[pin_project]
pub struct SwitchMap<S, F, I> {
    #[pin]
    upstream: S,
    mapper: F,
    #[pin]
    inner: Option<I>,
    upstream_done: bool,
    terminated: bool,
}

impl<S, F, T, I, U> Stream for SwitchMap<S, F, I>
where
    S: Stream<Item = StreamItem<T>>,
    F: FnMut(T) -> I,
    I: Stream<Item = StreamItem<U>>,
{
    type Item = StreamItem<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        while !*this.upstream_done {
            match this.upstream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    if this.inner.is_some() {
                        debug!("switch_map: dropping the previous inner stream");
                    }
                    let next = (this.mapper)(value);
                    this.inner.set(Some(next));
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    this.inner.set(None);
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => *this.upstream_done = true,
                Poll::Pending => break,
            }
        }

        let Some(inner) = this.inner.as_mut().as_pin_mut() else {
            if *this.upstream_done {
                *this.terminated = true;
                return Poll::Ready(None);
            }
            return Poll::Pending;
        };

        match inner.poll_next(cx) {
            Poll::Ready(Some(StreamItem::Value(value))) => {
                Poll::Ready(Some(StreamItem::Value(value)))
            }
            Poll::Ready(Some(StreamItem::Error(error))) => {
                *this.terminated = true;
                this.inner.set(None);
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            Poll::Ready(None) => {
                this.inner.set(None);
                if *this.upstream_done {
                    *this.terminated = true;
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

pub trait SwitchMapExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Maps every value to an inner stream and relays only the newest one.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::StreamItem;
    /// use rivulet_stream::SwitchMapExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let source = futures::stream::iter(vec![StreamItem::Value(1), StreamItem::Value(2)]);
    /// let items: Vec<_> = source
    ///     .switch_map(|v| futures::stream::iter(vec![StreamItem::Value(v * 10)]))
    ///     .collect()
    ///     .await;
    /// assert_eq!(items, vec![StreamItem::Value(20)]);
    /// # }
    /// ```
    fn switch_map<U, I, F>(self, mapper: F) -> SwitchMap<Self, F, I>
    where
        F: FnMut(T) -> I,
        I: Stream<Item = StreamItem<U>>,
    {
        SwitchMap {
            upstream: self,
            mapper,
            inner: None,
            upstream_done: false,
            terminated: false,
        }
    }
}

impl<S, T> SwitchMapExt<T> for S where S: Stream<Item = StreamItem<T>> {}

type Identity<I> = fn(I) -> I;

/// Switching over a stream of streams.
pub trait SwitchExt<I, U>: Stream<Item = StreamItem<I>> + Sized
where
    I: Stream<Item = StreamItem<U>>,
{
    fn switch(self) -> SwitchMap<Self, Identity<I>, I> {
        let identity: Identity<I> = |inner| inner;
        self.switch_map(identity)
    }
}

impl<S, I, U> SwitchExt<I, U> for S
where
    S: Stream<Item = StreamItem<I>>,
    I: Stream<Item = StreamItem<U>>,
{
}
