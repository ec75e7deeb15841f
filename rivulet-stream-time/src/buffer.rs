// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Size- and time-bounded batching.
//!
//! A batch is flushed when it reaches `max_size` items or when `max_time` elapsed
//! since the previous flush, whichever happens first. Flushing restarts the
//! timer; a timer tick with an empty batch emits nothing. A partial batch is
//! flushed on completion.
//!
//! An upstream error (including a cancellation) discards the partial batch and is
//! forwarded, so a cancelled wait never surfaces as a truncated batch.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::{RivuletError, StreamItem};
use rivulet_runtime::timer::Timer;

use crate::MAX_ITEMS_PER_POLL;

pub trait BufferExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Batches with an explicit timer.
    ///
    /// A zero `max_size` or `max_time` fails the stream with [`RivuletError::InvalidState`].
    fn buffer_with_timer<TM: Timer>(
        self,
        max_size: usize,
        max_time: Duration,
        timer: TM,
    ) -> Buffer<Self, T, TM> {
        Buffer {
            stream: self,
            max_size,
            max_time,
            timer,
            batch: Vec::new(),
            deadline: None,
            sleep: None,
            terminated: false,
        }
    }

    #[cfg(feature = "runtime-tokio")]
    fn buffer(
        self,
        max_size: usize,
        max_time: Duration,
    ) -> Buffer<Self, T, rivulet_runtime::DefaultTimer> {
        self.buffer_with_timer(max_size, max_time, rivulet_runtime::DefaultTimer::default())
    }
}

impl<S, T> BufferExt<T> for S where S: Stream<Item = StreamItem<T>> {}

#[pin_project]
pub struct Buffer<S, T, TM: Timer> {
    #[pin]
    stream: S,
    max_size: usize,
    max_time: Duration,
    timer: TM,
    batch: Vec<T>,
    deadline: Option<TM::Instant>,
    #[pin]
    sleep: Option<TM::Sleep>,
    terminated: bool,
}

impl<S, T, TM> Stream for Buffer<S, T, TM>
where
    S: Stream<Item = StreamItem<T>>,
    TM: Timer,
{
    type Item = StreamItem<Vec<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        if *this.max_size == 0 || this.max_time.is_zero() {
            *this.terminated = true;
            return Poll::Ready(Some(StreamItem::Error(RivuletError::invalid_state(
                "buffer size and time span must be positive",
            ))));
        }

        if this.deadline.is_none() {
            *this.deadline = Some(this.timer.now() + *this.max_time);
            this.sleep.set(Some(this.timer.sleep_future(*this.max_time)));
        }

        let mut drained = 0;
        loop {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    this.batch.push(value);
                    let now = this.timer.now();
                    let expired = this.deadline.is_some_and(|deadline| deadline <= now);
                    if this.batch.len() >= *this.max_size || expired {
                        *this.deadline = Some(now + *this.max_time);
                        this.sleep.set(Some(this.timer.sleep_future(*this.max_time)));
                        let batch = core::mem::take(this.batch);
                        return Poll::Ready(Some(StreamItem::Value(batch)));
                    }
                    drained += 1;
                    if drained >= MAX_ITEMS_PER_POLL {
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    continue;
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    this.batch.clear();
                    this.sleep.set(None);
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => {
                    *this.terminated = true;
                    this.sleep.set(None);
                    if this.batch.is_empty() {
                        return Poll::Ready(None);
                    }
                    let batch = core::mem::take(this.batch);
                    return Poll::Ready(Some(StreamItem::Value(batch)));
                }
                Poll::Pending => {}
            }

            let Some(sleep) = this.sleep.as_mut().as_pin_mut() else {
                return Poll::Pending;
            };
            if sleep.poll(cx).is_pending() {
                return Poll::Pending;
            }

            *this.deadline = Some(this.timer.now() + *this.max_time);
            this.sleep.set(Some(this.timer.sleep_future(*this.max_time)));
            if !this.batch.is_empty() {
                let batch = core::mem::take(this.batch);
                return Poll::Ready(Some(StreamItem::Value(batch)));
            }
        }
    }
}
