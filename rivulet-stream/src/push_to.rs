// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Recording values into a shared collection as they pass.
//!
//! Each value is cloned into the target before it is emitted downstream. With a
//! length limit the oldest entries are evicted after every push; a limit read
//! from a closure is re-read on every value, so it can shrink or grow while the
//! stream runs. Errors and completion pass through without touching the target.

use futures::Stream;
use parking_lot::Mutex;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A collection [`PushToExt`] can append to.
pub trait PushTarget<T> {
    fn push_item(&mut self, item: T);

    /// Evicts from the front until at most `max_len` entries remain.
    fn keep_last(&mut self, max_len: usize);
}

impl<T> PushTarget<T> for Vec<T> {
    fn push_item(&mut self, item: T) {
        self.push(item);
    }

    fn keep_last(&mut self, max_len: usize) {
        if self.len() > max_len {
            let excess = self.len() - max_len;
            self.drain(..excess);
        }
    }
}

impl<T> PushTarget<T> for VecDeque<T> {
    fn push_item(&mut self, item: T) {
        self.push_back(item);
    }

    fn keep_last(&mut self, max_len: usize) {
        while self.len() > max_len {
            self.pop_front();
        }
    }
}

enum Limit {
    Unbounded,
    Fixed(usize),
    Dynamic(Box<dyn Fn() -> usize + Send + Sync>),
}

impl Limit {
    fn current(&self) -> Option<usize> {
        match self {
            Limit::Unbounded => None,
            Limit::Fixed(max_len) => Some(*max_len),
            Limit::Dynamic(limit) => Some(limit()),
        }
    }
}

#[pin_project]
pub struct PushTo<S, C> {
    #[pin]
    upstream: S,
    target: Arc<Mutex<C>>,
    limit: Limit,
}

impl<S, C, T> Stream for PushTo<S, C>
where
    S: Stream<Item = StreamItem<T>>,
    C: PushTarget<T>,
    T: Clone,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        let item = match this.upstream.poll_next(cx) {
            Poll::Ready(Some(item)) => item,
            other => return other,
        };

        if let StreamItem::Value(value) = &item {
            let max_len = this.limit.current();
            let mut target = this.target.lock();
            target.push_item(value.clone());
            if let Some(max_len) = max_len {
                target.keep_last(max_len);
            }
        }

        Poll::Ready(Some(item))
    }
}

pub trait PushToExt<T>: Stream<Item = StreamItem<T>> + Sized
where
    T: Clone,
{
    /// Appends every value to `target`.
    fn push_to<C>(self, target: Arc<Mutex<C>>) -> PushTo<Self, C>
    where
        C: PushTarget<T>,
    {
        PushTo {
            upstream: self,
            target,
            limit: Limit::Unbounded,
        }
    }

    /// Appends every value to `target`, keeping only the newest `max_len`.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use parking_lot::Mutex;
    /// use rivulet_core::StreamItem;
    /// use rivulet_stream::PushToExt;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let recent = Arc::new(Mutex::new(Vec::new()));
    /// let source = futures::stream::iter((0..10).map(StreamItem::Value));
    /// let passed = source.push_to_bounded(recent.clone(), 3).count().await;
    ///
    /// assert_eq!(passed, 10);
    /// assert_eq!(*recent.lock(), vec![7, 8, 9]);
    /// # }
    /// ```
    fn push_to_bounded<C>(self, target: Arc<Mutex<C>>, max_len: usize) -> PushTo<Self, C>
    where
        C: PushTarget<T>,
    {
        PushTo {
            upstream: self,
            target,
            limit: Limit::Fixed(max_len),
        }
    }

    /// Appends every value to `target`, keeping only the newest `limit()`
    /// entries as of that value.
    fn push_to_with_limit<C, L>(self, target: Arc<Mutex<C>>, limit: L) -> PushTo<Self, C>
    where
        C: PushTarget<T>,
        L: Fn() -> usize + Send + Sync + 'static,
    {
        PushTo {
            upstream: self,
            target,
            limit: Limit::Dynamic(Box::new(limit)),
        }
    }
}

impl<S, T> PushToExt<T> for S
where
    S: Stream<Item = StreamItem<T>>,
    T: Clone,
{
}
