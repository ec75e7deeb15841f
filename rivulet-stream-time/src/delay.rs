// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Shifts every value later by a fixed duration.
//!
//! Each value is held for `duration` measured from when it was pulled from the
//! upstream; values keep their relative spacing and order. The upstream is read
//! eagerly while earlier values wait. Errors are forwarded without delay and end
//! the stream, dropping values still being held.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use rivulet_runtime::timer::Timer;
use std::collections::VecDeque;

pub trait DelayExt<T>: Stream<Item = StreamItem<T>> + Sized {
    fn delay_with_timer<TM: Timer>(self, duration: Duration, timer: TM) -> Delay<Self, T, TM> {
        Delay {
            stream: self,
            duration,
            timer,
            held: VecDeque::new(),
            sleep: None,
            stream_ended: false,
            terminated: false,
        }
    }

    #[cfg(feature = "runtime-tokio")]
    fn delay(self, duration: Duration) -> Delay<Self, T, rivulet_runtime::DefaultTimer> {
        self.delay_with_timer(duration, rivulet_runtime::DefaultTimer::default())
    }
}

impl<S, T> DelayExt<T> for S where S: Stream<Item = StreamItem<T>> {}

#[pin_project]
pub struct Delay<S, T, TM: Timer> {
    #[pin]
    stream: S,
    duration: Duration,
    timer: TM,
    held: VecDeque<(TM::Instant, T)>,
    #[pin]
    sleep: Option<TM::Sleep>,
    stream_ended: bool,
    terminated: bool,
}

impl<S, T, TM> Stream for Delay<S, T, TM>
where
    S: Stream<Item = StreamItem<T>>,
    TM: Timer,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }

        while !*this.stream_ended {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    let due = this.timer.now() + *this.duration;
                    this.held.push_back((due, value));
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    this.held.clear();
                    this.sleep.set(None);
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => *this.stream_ended = true,
                Poll::Pending => break,
            }
        }

        loop {
            let Some(&(due, _)) = this.held.front() else {
                if *this.stream_ended {
                    *this.terminated = true;
                    return Poll::Ready(None);
                }
                return Poll::Pending;
            };

            if this.sleep.is_none() {
                this.sleep
                    .set(Some(this.timer.sleep_future(this.timer.until(due))));
            }

            if let Some(sleep) = this.sleep.as_mut().as_pin_mut() {
                if sleep.poll(cx).is_pending() {
                    return Poll::Pending;
                }
            }

            this.sleep.set(None);
            if let Some((_, value)) = this.held.pop_front() {
                return Poll::Ready(Some(StreamItem::Value(value)));
            }
        }
    }
}
