// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Periodic integer sources.
//!
//! The schedule starts at the first poll: the first tick is due after the
//! initial delay, every later one `period` after the previous deadline. Deadlines
//! are absolute, so a slow consumer receives overdue ticks back to back instead of
//! shifting the schedule.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::{RivuletError, StreamItem};
use rivulet_runtime::timer::Timer;

#[pin_project]
pub struct Interval<TM: Timer> {
    timer: TM,
    initial_delay: Duration,
    period: Duration,
    next_value: u64,
    end: Option<u64>,
    deadline: Option<TM::Instant>,
    #[pin]
    sleep: Option<TM::Sleep>,
    terminated: bool,
}

impl<TM: Timer> Interval<TM> {
    /// Emits `start, start + 1, ...` on the schedule, `count` values in total
    /// (`None` is unbounded). The sequence stops at `u64::MAX`.
    ///
    /// A zero `period` with more than one tick to produce fails the stream with
    /// [`RivuletError::InvalidState`].
    pub fn with_timer(
        timer: TM,
        start: u64,
        count: Option<u64>,
        initial_delay: Duration,
        period: Duration,
    ) -> Self {
        Self {
            timer,
            initial_delay,
            period,
            next_value: start,
            end: count.map(|count| start.saturating_add(count)),
            deadline: None,
            sleep: None,
            terminated: false,
        }
    }
}

impl<TM: Timer> Stream for Interval<TM> {
    type Item = StreamItem<u64>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        if *this.terminated {
            return Poll::Ready(None);
        }
        if this.end.is_some_and(|end| *this.next_value >= end) {
            *this.terminated = true;
            return Poll::Ready(None);
        }

        let deadline = match *this.deadline {
            Some(deadline) => deadline,
            None => {
                let more_than_one = this
                    .end
                    .map_or(true, |end| end - *this.next_value > 1);
                if this.period.is_zero() && more_than_one {
                    *this.terminated = true;
                    return Poll::Ready(Some(StreamItem::Error(RivuletError::invalid_state(
                        "interval period must be positive",
                    ))));
                }
                let first = this.timer.now() + *this.initial_delay;
                *this.deadline = Some(first);
                this.sleep
                    .set(Some(this.timer.sleep_future(*this.initial_delay)));
                first
            }
        };

        if let Some(sleep) = this.sleep.as_mut().as_pin_mut() {
            if sleep.poll(cx).is_pending() {
                return Poll::Pending;
            }
        }

        let value = *this.next_value;
        match value.checked_add(1) {
            Some(next_value) => *this.next_value = next_value,
            // Last representable tick
            None => *this.end = Some(value),
        }

        let next = deadline + *this.period;
        *this.deadline = Some(next);
        this.sleep
            .set(Some(this.timer.sleep_future(this.timer.until(next))));

        Poll::Ready(Some(StreamItem::Value(value)))
    }
}

/// Ticks `0, 1, 2, ...` every `period`, the first after one period.
#[cfg(feature = "runtime-tokio")]
pub fn interval(period: Duration) -> Interval<rivulet_runtime::DefaultTimer> {
    interval_with_delay(period, period)
}

/// Ticks `0, 1, 2, ...`, the first after `initial_delay` and then every `period`.
#[cfg(feature = "runtime-tokio")]
pub fn interval_with_delay(
    initial_delay: Duration,
    period: Duration,
) -> Interval<rivulet_runtime::DefaultTimer> {
    Interval::with_timer(Default::default(), 0, None, initial_delay, period)
}

/// Ticks `start .. start + count`, the first after `initial_delay` and then every
/// `period`, then completes.
///
/// ```
/// use futures::StreamExt;
/// use rivulet_stream_time::interval_range;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let ticks: Vec<u64> = interval_range(5, 3, Duration::ZERO, Duration::from_millis(1))
///     .filter_map(|item| async move { item.ok() })
///     .collect()
///     .await;
/// assert_eq!(ticks, vec![5, 6, 7]);
/// # }
/// ```
#[cfg(feature = "runtime-tokio")]
pub fn interval_range(
    start: u64,
    count: u64,
    initial_delay: Duration,
    period: Duration,
) -> Interval<rivulet_runtime::DefaultTimer> {
    Interval::with_timer(Default::default(), start, Some(count), initial_delay, period)
}

/// Emits a single `0` after `delay`, then completes.
#[cfg(feature = "runtime-tokio")]
pub fn timer(delay: Duration) -> Interval<rivulet_runtime::DefaultTimer> {
    Interval::with_timer(Default::default(), 0, Some(1), delay, Duration::ZERO)
}
