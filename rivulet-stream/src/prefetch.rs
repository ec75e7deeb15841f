// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Read-ahead window between a producer and a slower consumer.
//!
//! On first poll a background task starts copying the upstream into a private
//! windowed queue. It pulls until `prefetch` items wait undelivered, then pauses
//! until the consumer has drained the window down to the low-water mark.

use futures::stream::{BoxStream, StreamExt};
use futures::Stream;
use rivulet_core::{RivuletError, StreamItem, UnicastCursor, UnicastQueue};
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Window size and refill threshold of a [`Prefetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Maximum number of items read ahead.
    pub prefetch: usize,
    /// Occupancy at which reading resumes after the window filled up.
    /// `None` means a quarter of `prefetch`.
    pub low_water_mark: Option<usize>,
}

impl PrefetchConfig {
    #[must_use]
    pub fn new(prefetch: usize) -> Self {
        Self {
            prefetch,
            low_water_mark: None,
        }
    }

    #[must_use]
    pub fn with_low_water_mark(mut self, low_water_mark: usize) -> Self {
        self.low_water_mark = Some(low_water_mark);
        self
    }

    pub fn resume_at(&self) -> usize {
        self.low_water_mark.unwrap_or(self.prefetch / 4)
    }

    /// # Errors
    ///
    /// [`RivuletError::InvalidState`] for a zero window or a low-water mark that
    /// is not below the window size.
    pub fn validate(&self) -> rivulet_core::Result<()> {
        if self.prefetch == 0 {
            return Err(RivuletError::invalid_state("prefetch must be positive"));
        }
        if self.resume_at() >= self.prefetch {
            return Err(RivuletError::invalid_state(format!(
                "low-water mark {} must be below prefetch {}",
                self.resume_at(),
                self.prefetch
            )));
        }
        Ok(())
    }
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self::new(32)
    }
}

/// Starts filling a fresh window from `source` right away.
pub(crate) fn start_window<S, T>(
    source: S,
    config: PrefetchConfig,
) -> Result<UnicastCursor<T>, RivuletError>
where
    S: Stream<Item = StreamItem<T>> + Send + 'static,
    T: Send + 'static,
{
    config.validate()?;
    let queue = UnicastQueue::windowed(config.prefetch, config.resume_at());
    let cursor = queue.subscribe()?;
    queue.fill_from(source);
    Ok(cursor)
}

enum PrefetchState<T> {
    Idle {
        source: BoxStream<'static, StreamItem<T>>,
        config: PrefetchConfig,
    },
    Running(UnicastCursor<T>),
    Failed(RivuletError),
    Done,
}

pub struct Prefetch<T> {
    state: PrefetchState<T>,
}

impl<T: Send + 'static> Prefetch<T> {
    pub fn new<S>(source: S, config: PrefetchConfig) -> Self
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        let state = match config.validate() {
            Ok(()) => PrefetchState::Idle {
                source: source.boxed(),
                config,
            },
            Err(error) => PrefetchState::Failed(error),
        };
        Self { state }
    }
}

impl<T: Send + 'static> Stream for Prefetch<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match &mut self.state {
                PrefetchState::Running(cursor) => return cursor.poll_next_unpin(cx),
                PrefetchState::Done => return Poll::Ready(None),
                _ => {}
            }

            match mem::replace(&mut self.state, PrefetchState::Done) {
                PrefetchState::Idle { source, config } => match start_window(source, config) {
                    Ok(cursor) => self.state = PrefetchState::Running(cursor),
                    Err(error) => return Poll::Ready(Some(StreamItem::Error(error))),
                },
                PrefetchState::Failed(error) => return Poll::Ready(Some(StreamItem::Error(error))),
                PrefetchState::Running(_) | PrefetchState::Done => {}
            }
        }
    }
}

pub trait PrefetchExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Reads up to `prefetch` items ahead of the consumer.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::StreamItem;
    /// use rivulet_stream::{PrefetchConfig, PrefetchExt};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let source = futures::stream::iter((0..10).map(StreamItem::Value));
    /// let items: Vec<_> = source
    ///     .prefetch(PrefetchConfig::new(4))
    ///     .filter_map(|item| async move { item.ok() })
    ///     .collect()
    ///     .await;
    /// assert_eq!(items, (0..10).collect::<Vec<_>>());
    /// # }
    /// ```
    fn prefetch(self, config: PrefetchConfig) -> Prefetch<T>
    where
        Self: Send + 'static,
        T: Send + 'static,
    {
        Prefetch::new(self, config)
    }
}

impl<S, T> PrefetchExt<T> for S where S: Stream<Item = StreamItem<T>> {}
