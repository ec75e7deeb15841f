// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Trailing debounce.
//!
//! Every value (re)starts a quiet-period timer; when the timer elapses before the
//! next value arrives, the pending value is emitted. A newer value replaces the
//! pending one and restarts the timer.
//!
//! On completion a value still waiting for its timer is emitted only when
//! `emit_last` is set. An error drops the pending value and is forwarded at once.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use futures::Stream;
use pin_project::pin_project;
use rivulet_core::StreamItem;
use rivulet_runtime::timer::Timer;

use crate::MAX_ITEMS_PER_POLL;

pub trait DebounceExt<T>: Stream<Item = StreamItem<T>> + Sized {
    /// Debounces with an explicit timer.
    fn debounce_with_timer<TM: Timer>(
        self,
        delay: Duration,
        emit_last: bool,
        timer: TM,
    ) -> Debounce<Self, T, TM> {
        Debounce {
            stream: self,
            delay,
            emit_last,
            timer,
            pending: None,
            deadline: None,
            sleep: None,
            stream_ended: false,
            terminated: false,
        }
    }

    /// Debounces with the runtime's default timer.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rivulet_core::StreamItem;
    /// use rivulet_stream_time::DebounceExt;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let source = futures::stream::iter(vec![StreamItem::Value(1), StreamItem::Value(2)]);
    /// let items: Vec<_> = source
    ///     .debounce(Duration::from_millis(10), true)
    ///     .collect()
    ///     .await;
    /// assert_eq!(items, vec![StreamItem::Value(2)]);
    /// # }
    /// ```
    #[cfg(feature = "runtime-tokio")]
    fn debounce(
        self,
        delay: Duration,
        emit_last: bool,
    ) -> Debounce<Self, T, rivulet_runtime::DefaultTimer> {
        self.debounce_with_timer(delay, emit_last, rivulet_runtime::DefaultTimer::default())
    }
}

impl<S, T> DebounceExt<T> for S where S: Stream<Item = StreamItem<T>> {}

#[pin_project]
pub struct Debounce<S, T, TM: Timer> {
    #[pin]
    stream: S,
    delay: Duration,
    emit_last: bool,
    timer: TM,
    pending: Option<T>,
    deadline: Option<TM::Instant>,
    #[pin]
    sleep: Option<TM::Sleep>,
    stream_ended: bool,
    terminated: bool,
}

impl<S, T, TM> Stream for Debounce<S, T, TM>
where
    S: Stream<Item = StreamItem<T>>,
    TM: Timer,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        let mut drained = 0;

        loop {
            if *this.terminated {
                return Poll::Ready(None);
            }

            if *this.stream_ended {
                *this.terminated = true;
                this.sleep.set(None);
                return match this.pending.take() {
                    Some(value) if *this.emit_last => Poll::Ready(Some(StreamItem::Value(value))),
                    _ => Poll::Ready(None),
                };
            }

            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(value))) => {
                    let now = this.timer.now();
                    let due = this.deadline.is_some_and(|deadline| deadline <= now);
                    let previous = this.pending.replace(value);
                    *this.deadline = Some(now + *this.delay);
                    this.sleep.set(Some(this.timer.sleep_future(*this.delay)));
                    // The quiet period of the previous value ended before this one arrived
                    if let Some(previous) = previous.filter(|_| due) {
                        return Poll::Ready(Some(StreamItem::Value(previous)));
                    }
                    drained += 1;
                    if drained >= MAX_ITEMS_PER_POLL {
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    continue;
                }
                Poll::Ready(Some(StreamItem::Error(error))) => {
                    *this.pending = None;
                    *this.deadline = None;
                    this.sleep.set(None);
                    *this.terminated = true;
                    return Poll::Ready(Some(StreamItem::Error(error)));
                }
                Poll::Ready(None) => {
                    *this.stream_ended = true;
                    continue;
                }
                Poll::Pending => {}
            }

            if let Some(sleep) = this.sleep.as_mut().as_pin_mut() {
                if sleep.poll(cx).is_ready() {
                    this.sleep.set(None);
                    *this.deadline = None;
                    if let Some(value) = this.pending.take() {
                        return Poll::Ready(Some(StreamItem::Value(value)));
                    }
                }
            }

            return Poll::Pending;
        }
    }
}
