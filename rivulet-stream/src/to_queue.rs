// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Turning a cold stream into a hot, multi-consumer queue.
//!
//! The returned queue owns a background task copying the upstream into it: an
//! upstream error fails the queue and the end of the upstream completes it. The
//! task stops once the queue handle and all of its cursors are gone.
//!
//! The copy starts on the next scheduling point of the runtime, so cursors
//! subscribed right after the call see the stream from its first item.

use futures::Stream;
use rivulet_core::{MulticastQueue, ReplayConfig, ReplayQueue, StreamItem};

pub trait ToQueueExt<T>: Stream<Item = StreamItem<T>> + Sized
where
    T: Clone + Send + Sync + 'static,
{
    /// Shares the stream live: each cursor sees the items pushed after it attached.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::StreamItem;
    /// use rivulet_stream::ToQueueExt;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let queue = futures::stream::iter(vec![StreamItem::Value(1), StreamItem::Value(2)])
    ///     .to_multicast_queue();
    /// let first = queue.subscribe();
    /// let second = queue.subscribe();
    ///
    /// assert_eq!(first.collect::<Vec<_>>().await.len(), 2);
    /// assert_eq!(second.collect::<Vec<_>>().await.len(), 2);
    /// # }
    /// ```
    fn to_multicast_queue(self) -> MulticastQueue<T>
    where
        Self: Send + 'static,
    {
        let queue = MulticastQueue::new();
        queue.fill_from(self);
        queue
    }

    /// Shares the stream with history: each cursor first replays what `config`
    /// retains, then follows live.
    fn to_replay_queue(self, config: ReplayConfig) -> ReplayQueue<T>
    where
        Self: Send + 'static,
    {
        let queue = ReplayQueue::new(config);
        queue.fill_from(self);
        queue
    }
}

impl<S, T> ToQueueExt<T> for S
where
    S: Stream<Item = StreamItem<T>>,
    T: Clone + Send + Sync + 'static,
{
}
