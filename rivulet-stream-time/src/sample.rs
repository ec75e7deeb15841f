// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::{RivuletError, StreamItem};
use rivulet_runtime::timer::Timer;

use crate::MAX_ITEMS_PER_POLL;

/// Periodic sampling of the latest value.
///
/// Every `period`, starting from the first poll, the most recent value seen since
/// the previous tick is emitted; ticks with nothing new are skipped. Ticks follow
/// absolute deadlines, so a late poll does not shift the schedule. A zero period
/// fails the stream with [`RivuletError::InvalidState`].
pub trait SampleExt<T>: Stream<Item = StreamItem<T>> + Sized {
    fn sample_with_timer<TM: Timer>(
        self,
        period: Duration,
        emit_last: bool,
        timer: TM,
    ) -> Sample<Self, T, TM> {
        Sample {
            stream: self,
            period,
            emit_last,
            timer,
            latest: None,
            deadline: None,
            sleep: None,
            terminated: false,
        }
    }

    #[cfg(feature = "runtime-tokio")]
    fn sample(
        self,
        period: Duration,
        emit_last: bool,
    ) -> Sample<Self, T, rivulet_runtime::DefaultTimer> {
        self.sample_with_timer(period, emit_last, rivulet_runtime::DefaultTimer::default())
    }

    /// Same operator as [`SampleExt::sample`].
    #[cfg(feature = "runtime-tokio")]
    fn throttle(
        self,
        period: Duration,
        emit_last: bool,
    ) -> Sample<Self, T, rivulet_runtime::DefaultTimer> {
        self.sample(period, emit_last)
    }
}

impl<S, T> SampleExt<T> for S where S: Stream<Item = StreamItem<T>> {}

#[pin_project]
pub struct Sample<S, T, TM: Timer> {
    #[pin]
    stream: S,
    period: Duration,
    emit_last: bool,
    timer: TM,
    latest: Option<T>,
    deadline: Option<TM::Instant>,
    #[pin]
    sleep: Option<TM::Sleep>,
    terminated: bool,
}

impl<S, T, TM> Stream for Sample<S, T, TM>
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

        if this.period.is_zero() {
            *this.terminated = true;
            return Poll::Ready(Some(StreamItem::Error(RivuletError::invalid_state(
                "sample period must be positive",
            ))));
        }

        if this.deadline.is_none() {
            let first = this.timer.now() + *this.period;
            *this.deadline = Some(first);
            this.sleep.set(Some(this.timer.sleep_future(*this.period)));
        }

        let mut drained = 0;
        loop {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    *this.latest = Some(value);
                    if this.deadline.is_some_and(|deadline| deadline <= this.timer.now()) {
                        let next = next_deadline(this.timer, *this.deadline, *this.period);
                        *this.deadline = Some(next);
                        this.sleep
                            .set(Some(this.timer.sleep_future(this.timer.until(next))));
                        if let Some(value) = this.latest.take() {
                            return Poll::Ready(Some(StreamItem::Value(value)));
                        }
                    }
                    drained += 1;
                    if drained >= MAX_ITEMS_PER_POLL {
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.terminated = true;
                    *this.latest = None;
                    this.sleep.set(None);
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => {
                    *this.terminated = true;
                    this.sleep.set(None);
                    return match this.latest.take() {
                        Some(value) if *this.emit_last => {
                            Poll::Ready(Some(StreamItem::Value(value)))
                        }
                        _ => Poll::Ready(None),
                    };
                }
                Poll::Pending => break,
            }
        }

        loop {
            let Some(sleep) = this.sleep.as_mut().as_pin_mut() else {
                return Poll::Pending;
            };
            if sleep.poll(cx).is_pending() {
                return Poll::Pending;
            }

            let next = next_deadline(this.timer, *this.deadline, *this.period);
            *this.deadline = Some(next);
            this.sleep
                .set(Some(this.timer.sleep_future(this.timer.until(next))));

            if let Some(value) = this.latest.take() {
                return Poll::Ready(Some(StreamItem::Value(value)));
            }
        }
    }
}

/// First tick strictly after now, keeping the schedule anchored to `deadline`.
fn next_deadline<TM: Timer>(
    timer: &TM,
    deadline: Option<TM::Instant>,
    period: Duration,
) -> TM::Instant {
    let now = timer.now();
    let mut next = deadline.unwrap_or(now) + period;
    while next <= now {
        next = next + period;
    }
    next
}
