// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::broadcast::{Broadcast, BroadcastCursor, Retention};
use super::Terminal;
use crate::{QueueError, RivuletError, StreamItem};
use futures::Stream;
use std::sync::Arc;

/// Hot queue broadcasting every item to the cursors attached at push time.
///
/// Late cursors do not see earlier items. All cursors observe the same items in
/// the same order and the same terminal signal. Items pushed while nobody is
/// attached are discarded.
///
/// ```
/// use rivulet_core::{MulticastQueue, StreamItem};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let queue = MulticastQueue::new();
/// queue.next(0).unwrap();
///
/// let mut first = queue.subscribe();
/// let mut second = queue.subscribe();
/// queue.next(1).unwrap();
/// queue.complete();
///
/// assert_eq!(first.next().await, Some(StreamItem::Value(1)));
/// assert_eq!(second.next().await, Some(StreamItem::Value(1)));
/// assert_eq!(first.next().await, None);
/// # }
/// ```
pub struct MulticastQueue<T: Clone + Send + Sync + 'static> {
    shared: Arc<Broadcast<T>>,
}

impl<T: Clone + Send + Sync + 'static> MulticastQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Broadcast::new(Retention::Live),
        }
    }

    /// Attaches a new cursor at the current write position.
    ///
    /// Subscribing after a terminal signal yields a cursor that reports it at once.
    pub fn subscribe(&self) -> BroadcastCursor<T> {
        self.shared.attach()
    }

    /// Broadcasts an item to every attached cursor.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] after a terminal signal.
    pub fn next(&self, item: T) -> Result<(), QueueError> {
        self.shared.push(item)
    }

    /// Fails every cursor. No-op after a terminal signal.
    pub fn error(&self, error: RivuletError) {
        self.shared.terminate(Terminal::Failed(error));
    }

    /// Completes every cursor. No-op after a terminal signal.
    pub fn complete(&self) {
        self.shared.terminate(Terminal::Completed);
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    /// `false` once every cursor detached or a terminal signal was set.
    #[must_use]
    pub fn has_consumers(&self) -> bool {
        self.shared.has_consumers()
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.shared.consumer_count()
    }

    /// Feeds the queue from `source` in a background task.
    ///
    /// See [`UnicastQueue::fill_from`](super::UnicastQueue::fill_from) for the
    /// lifetime rules.
    pub fn fill_from<S>(&self, source: S)
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        self.shared.fill_from(source);
    }
}

impl<T: Clone + Send + Sync + 'static> Default for MulticastQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Clone for MulticastQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}
