// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Sharing one upstream subscription inside a selector.
//!
//! On the first poll the selector receives a fresh queue, subscribes to it as
//! many times as it needs and returns the output stream. Only then is the
//! upstream opened, once, and copied into the queue, so every cursor taken
//! inside the selector sees the upstream from its first item.
//!
//! Dropping the output drops the selector's cursors and the queue handle, which
//! stops the copy and disposes the upstream.

use futures::Stream;
use pin_project::pin_project;
use rivulet_core::{MulticastQueue, ReplayConfig, ReplayQueue, StreamItem};
use std::pin::Pin;
use std::task::{Context, Poll};

type Connect<R, Q> = Box<dyn FnOnce() -> (R, Q) + Send>;

#[pin_project]
pub struct Publish<R, Q> {
    connect: Option<Connect<R, Q>>,
    queue: Option<Q>,
    #[pin]
    output: Option<R>,
}

impl<R, Q> Publish<R, Q> {
    fn new(connect: Connect<R, Q>) -> Self {
        Self {
            connect: Some(connect),
            queue: None,
            output: None,
        }
    }
}

impl<R, Q, U> Stream for Publish<R, Q>
where
    R: Stream<Item = StreamItem<U>>,
{
    type Item = StreamItem<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if let Some(connect) = this.connect.take() {
            let (output, queue) = connect();
            this.output.set(Some(output));
            *this.queue = Some(queue);
        }

        match this.output.as_pin_mut() {
            Some(output) => output.poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

pub trait PublishExt<T>: Stream<Item = StreamItem<T>> + Sized + Send + 'static
where
    T: Clone + Send + Sync + 'static,
{
    /// Runs `selector` over a live share of this stream.
    ///
    /// Cursors taken inside the selector see every item; cursors taken later
    /// only see what is pushed after they attach.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::StreamItem;
    /// use rivulet_merge::MergeWithExt;
    /// use rivulet_stream::PublishExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let source = futures::stream::iter(vec![StreamItem::Value(1), StreamItem::Value(2)]);
    /// let items: Vec<_> = source
    ///     .publish(|shared| shared.subscribe().merge_with(shared.subscribe()))
    ///     .collect()
    ///     .await;
    /// assert_eq!(items.len(), 4);
    /// # }
    /// ```
    fn publish<R, U, F>(self, selector: F) -> Publish<R, MulticastQueue<T>>
    where
        F: FnOnce(&MulticastQueue<T>) -> R + Send + 'static,
        R: Stream<Item = StreamItem<U>>,
    {
        Publish::new(Box::new(move || {
            let queue = MulticastQueue::new();
            let output = selector(&queue);
            queue.fill_from(self);
            (output, queue)
        }))
    }

    /// Runs `selector` over a replayed share of this stream.
    ///
    /// Cursors taken at any time, including after the upstream completed,
    /// first see the history `config` retains.
    fn replay<R, U, F>(self, config: ReplayConfig, selector: F) -> Publish<R, ReplayQueue<T>>
    where
        F: FnOnce(&ReplayQueue<T>) -> R + Send + 'static,
        R: Stream<Item = StreamItem<U>>,
    {
        Publish::new(Box::new(move || {
            let queue = ReplayQueue::new(config);
            let output = selector(&queue);
            queue.fill_from(self);
            (output, queue)
        }))
    }
}

impl<S, T> PublishExt<T> for S
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
}
