// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Shared log with per-cursor read positions, backing multicast and replay queues.
//!
//! Entries carry absolute indices: `base` is the index of the oldest retained entry
//! and `base + log.len()` the write position. A cursor's position only grows and
//! never passes the write position. Multicast trims the prefix every cursor has
//! read; replay evicts by count and age, so a lagging cursor may jump forward.

use super::replay::ReplayConfig;
use super::Terminal;
use crate::{QueueError, RivuletError, RivuletTask, StreamItem};
use futures::future::{select, Either};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use rivulet_runtime::timer::Timer;
use rivulet_runtime::DefaultTimer;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};

type Instant = <DefaultTimer as Timer>::Instant;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Retention {
    /// No history: cursors start at the write position.
    Live,
    /// Keep a bounded history for late cursors.
    Replay(ReplayConfig),
}

struct Entry<T> {
    at: Instant,
    item: T,
}

struct CursorSlot {
    position: u64,
    waker: Option<Waker>,
}

struct BroadcastState<T> {
    log: VecDeque<Entry<T>>,
    base: u64,
    terminal: Option<Terminal>,
    cursors: HashMap<u64, CursorSlot>,
    next_cursor_id: u64,
}

impl<T> BroadcastState<T> {
    fn write_position(&self) -> u64 {
        self.base + self.log.len() as u64
    }

    fn pop_front(&mut self) {
        if self.log.pop_front().is_some() {
            self.base += 1;
        }
    }

    fn take_wakers(&mut self) -> Vec<Waker> {
        self.cursors
            .values_mut()
            .filter_map(|slot| slot.waker.take())
            .collect()
    }
}

pub(crate) struct Broadcast<T> {
    state: Mutex<BroadcastState<T>>,
    retention: Retention,
    timer: DefaultTimer,
    fill: Mutex<Option<RivuletTask>>,
}

impl<T: Clone + Send + Sync + 'static> Broadcast<T> {
    pub(crate) fn new(retention: Retention) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BroadcastState {
                log: VecDeque::new(),
                base: 0,
                terminal: None,
                cursors: HashMap::new(),
                next_cursor_id: 0,
            }),
            retention,
            timer: DefaultTimer::default(),
            fill: Mutex::new(None),
        })
    }

    pub(crate) fn push(&self, item: T) -> Result<(), QueueError> {
        let wakers = {
            let mut state = self.state.lock();
            if state.terminal.is_some() {
                return Err(QueueError::Closed);
            }

            let now = self.timer.now();
            match self.retention {
                Retention::Live => {
                    if state.cursors.is_empty() {
                        return Ok(());
                    }
                    state.log.push_back(Entry { at: now, item });
                }
                Retention::Replay(config) => {
                    state.log.push_back(Entry { at: now, item });
                    Self::evict(&mut state, config, now);
                }
            }
            state.take_wakers()
        };

        wakers.into_iter().for_each(Waker::wake);
        Ok(())
    }

    pub(crate) fn terminate(&self, terminal: Terminal) {
        let wakers = {
            let mut state = self.state.lock();
            if state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal);
            state.take_wakers()
        };

        wakers.into_iter().for_each(Waker::wake);
    }

    pub(crate) fn attach(self: &Arc<Self>) -> BroadcastCursor<T> {
        let mut state = self.state.lock();
        let position = match self.retention {
            Retention::Live => state.write_position(),
            Retention::Replay(config) => {
                Self::evict(&mut state, config, self.timer.now());
                state.base
            }
        };

        let id = state.next_cursor_id;
        state.next_cursor_id += 1;
        state.cursors.insert(
            id,
            CursorSlot {
                position,
                waker: None,
            },
        );

        BroadcastCursor {
            shared: self.clone(),
            id,
            done: false,
        }
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.state.lock().terminal.is_some()
    }

    pub(crate) fn has_consumers(&self) -> bool {
        let state = self.state.lock();
        state.terminal.is_none() && !state.cursors.is_empty()
    }

    pub(crate) fn consumer_count(&self) -> usize {
        self.state.lock().cursors.len()
    }

    pub(crate) fn retained(&self) -> usize {
        self.state.lock().log.len()
    }

    /// Installs a background task copying `source` into the queue.
    pub(crate) fn fill_from<S>(self: &Arc<Self>, source: S)
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = RivuletTask::spawn(move |cancel| async move {
            let mut source = Box::pin(source);
            while let Either::Left((item, _)) = select(source.next(), cancel.cancelled()).await {
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                match item {
                    Some(StreamItem::Value(value)) => {
                        if shared.push(value).is_err() {
                            break;
                        }
                    }
                    Some(StreamItem::Error(error)) => {
                        shared.terminate(Terminal::Failed(error));
                        break;
                    }
                    None => {
                        shared.terminate(Terminal::Completed);
                        break;
                    }
                }
            }
            debug!("broadcast fill loop finished");
        });

        *self.fill.lock() = Some(task);
    }

    fn evict(state: &mut BroadcastState<T>, config: ReplayConfig, now: Instant) {
        if let Some(max_size) = config.max_size {
            while state.log.len() > max_size {
                state.pop_front();
            }
        }
        if let Some(max_age) = config.max_age {
            while state
                .log
                .front()
                .is_some_and(|entry| now - entry.at > max_age)
            {
                state.pop_front();
            }
        }
    }

    // Drops the prefix already read by every cursor
    fn trim(&self, state: &mut BroadcastState<T>) {
        if let Retention::Live = self.retention {
            let low = state
                .cursors
                .values()
                .map(|slot| slot.position)
                .min()
                .unwrap_or_else(|| state.write_position());
            while state.base < low {
                state.pop_front();
            }
        }
    }

    fn detach(&self, id: u64) {
        let mut state = self.state.lock();
        if state.cursors.remove(&id).is_some() {
            self.trim(&mut state);
        }
    }
}

/// A cursor over a [`MulticastQueue`](super::MulticastQueue) or
/// [`ReplayQueue`](super::ReplayQueue).
///
/// Dropping the cursor detaches it; the producer side is not affected.
pub struct BroadcastCursor<T: Clone + Send + Sync + 'static> {
    shared: Arc<Broadcast<T>>,
    id: u64,
    done: bool,
}

impl<T: Clone + Send + Sync + 'static> BroadcastCursor<T> {
    fn finish(&mut self) {
        self.done = true;
        self.shared.detach(self.id);
    }
}

impl<T: Clone + Send + Sync + 'static> Stream for BroadcastCursor<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let shared = self.shared.clone();
        let mut guard = shared.state.lock();
        let state = &mut *guard;
        let base = state.base;
        let write = state.write_position();

        let Some(slot) = state.cursors.get_mut(&self.id) else {
            drop(guard);
            self.done = true;
            return Poll::Ready(None);
        };

        // Entries this cursor had not read yet may have been evicted
        if slot.position < base {
            slot.position = base;
        }

        if slot.position < write {
            let offset = (slot.position - base) as usize;
            slot.position += 1;
            let item = state.log.get(offset).map(|entry| entry.item.clone());
            shared.trim(state);
            drop(guard);

            return match item {
                Some(item) => Poll::Ready(Some(StreamItem::Value(item))),
                None => Poll::Ready(Some(StreamItem::Error(RivuletError::invalid_state(
                    "broadcast cursor outran the log",
                )))),
            };
        }

        match &state.terminal {
            Some(terminal) => {
                let terminal = terminal.clone();
                drop(guard);
                self.finish();
                match terminal {
                    Terminal::Completed => Poll::Ready(None),
                    Terminal::Failed(error) => Poll::Ready(Some(StreamItem::Error(error))),
                }
            }
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for BroadcastCursor<T> {
    fn drop(&mut self) {
        if !self.done {
            self.shared.detach(self.id);
        }
    }
}
