// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::ops::Deref;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::stream::{Map, StreamExt};
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use rivulet_runtime::timer::Timer;

/// A value paired with the instant it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamped<T, I> {
    pub value: T,
    pub timestamp: I,
}

impl<T, I> Timestamped<T, I> {
    pub fn new(value: T, timestamp: I) -> Self {
        Self { value, timestamp }
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, I> Deref for Timestamped<T, I> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

pub trait TimestampExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Stamps every value with `timer.now()` at the moment it is pulled.
    fn timestamped_with_timer<TM: Timer>(self, timer: TM) -> Stamp<Self, TM> {
        Stamp {
            stream: self,
            timer,
        }
    }

    #[cfg(feature = "runtime-tokio")]
    fn timestamped(self) -> Stamp<Self, rivulet_runtime::DefaultTimer> {
        self.timestamped_with_timer(rivulet_runtime::DefaultTimer::default())
    }
}

impl<S, T> TimestampExt<T> for S where S: Stream<Item = StreamItem<T>> {}

#[pin_project]
pub struct Stamp<S, TM> {
    #[pin]
    stream: S,
    timer: TM,
}

impl<S, T, TM> Stream for Stamp<S, TM>
where
    S: Stream<Item = StreamItem<T>>,
    TM: Timer,
{
    type Item = StreamItem<Timestamped<T, TM::Instant>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let timer = this.timer;
        this.stream
            .poll_next(cx)
            .map(|item| item.map(|item| item.map(|value| Timestamped::new(value, timer.now()))))
    }
}

type Unstamp<T, I> = fn(StreamItem<Timestamped<T, I>>) -> StreamItem<T>;

pub trait RemoveTimestampExt<T, I>: Stream<Item = StreamItem<Timestamped<T, I>>> + Sized {
    /// Drops the timestamps again.
    fn remove_timestamp(self) -> Map<Self, Unstamp<T, I>> {
        let unstamp: Unstamp<T, I> = |item| item.map(Timestamped::into_inner);
        self.map(unstamp)
    }
}

impl<S, T, I> RemoveTimestampExt<T, I> for S where
    S: Stream<Item = StreamItem<Timestamped<T, I>>>
{
}
