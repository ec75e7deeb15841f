// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::broadcast::{Broadcast, BroadcastCursor, Retention};
use super::Terminal;
use crate::{QueueError, RivuletError, StreamItem};
use core::time::Duration;
use futures::Stream;
use std::sync::Arc;

/// Retention bounds of a [`ReplayQueue`]. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayConfig {
    pub max_size: Option<usize>,
    pub max_age: Option<Duration>,
}

impl ReplayConfig {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_size: None,
            max_age: None,
        }
    }

    #[must_use]
    pub const fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

/// Queue replaying its retained history to every new cursor before live items.
///
/// Eviction runs on every push (and when a cursor attaches) and ignores cursor
/// positions: a slow cursor skips entries evicted before it read them. Every
/// cursor still sees a gap-free, in-order run of the production sequence after
/// such a skip.
///
/// ```
/// use rivulet_core::{ReplayConfig, ReplayQueue, StreamItem};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let queue = ReplayQueue::new(ReplayConfig::default().with_max_size(2));
/// for i in 1..=3 {
///     queue.next(i).unwrap();
/// }
/// queue.complete();
///
/// let late: Vec<_> = queue.subscribe().collect().await;
/// assert_eq!(late, vec![StreamItem::Value(2), StreamItem::Value(3)]);
/// # }
/// ```
pub struct ReplayQueue<T: Clone + Send + Sync + 'static> {
    shared: Arc<Broadcast<T>>,
    config: ReplayConfig,
}

impl<T: Clone + Send + Sync + 'static> ReplayQueue<T> {
    #[must_use]
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            shared: Broadcast::new(Retention::Replay(config)),
            config,
        }
    }

    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(ReplayConfig::unbounded())
    }

    #[must_use]
    pub fn config(&self) -> ReplayConfig {
        self.config
    }

    /// Attaches a cursor at the oldest retained entry.
    pub fn subscribe(&self) -> BroadcastCursor<T> {
        self.shared.attach()
    }

    /// Appends an item and applies the retention bounds.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] after a terminal signal.
    pub fn next(&self, item: T) -> Result<(), QueueError> {
        self.shared.push(item)
    }

    pub fn error(&self, error: RivuletError) {
        self.shared.terminate(Terminal::Failed(error));
    }

    pub fn complete(&self) {
        self.shared.terminate(Terminal::Completed);
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.is_terminated()
    }

    #[must_use]
    pub fn has_consumers(&self) -> bool {
        self.shared.has_consumers()
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.shared.consumer_count()
    }

    /// Number of entries currently retained for late cursors.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.shared.retained()
    }

    pub fn fill_from<S>(&self, source: S)
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        self.shared.fill_from(source);
    }
}

impl<T: Clone + Send + Sync + 'static> Clone for ReplayQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            config: self.config,
        }
    }
}
