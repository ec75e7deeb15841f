// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::Terminal;
use crate::{QueueError, RivuletError, RivuletTask, StreamItem};
use event_listener::Event;
use futures::future::{select, Either};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};

struct UnicastState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    resume_at: usize,
    paused: bool,
    terminal: Option<Terminal>,
    subscribed: bool,
    detached: bool,
    waker: Option<Waker>,
}

impl<T> UnicastState<T> {
    fn check_open(&self) -> Result<(), QueueError> {
        if self.terminal.is_some() || self.detached {
            Err(QueueError::Closed)
        } else {
            Ok(())
        }
    }

    // Once full, stays closed to producers until occupancy drops to `resume_at`
    fn has_space(&mut self) -> bool {
        if self.paused {
            if self.buffer.len() > self.resume_at {
                return false;
            }
            self.paused = false;
        }
        if self.buffer.len() >= self.capacity {
            self.paused = true;
            return false;
        }
        true
    }
}

struct Shared<T> {
    state: Mutex<UnicastState<T>>,
    space: Event,
    fill: Mutex<Option<RivuletTask>>,
}

/// Private push/pull bridge with a single consumer.
///
/// Items pushed before the cursor is opened are discarded. After the cursor is
/// dropped the producer side reports [`QueueError::Closed`].
///
/// ```
/// use rivulet_core::{StreamItem, UnicastQueue};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let queue = UnicastQueue::unbounded();
/// let mut cursor = queue.subscribe().unwrap();
///
/// queue.next(1).unwrap();
/// queue.complete();
///
/// assert_eq!(cursor.next().await, Some(StreamItem::Value(1)));
/// assert_eq!(cursor.next().await, None);
/// assert!(queue.subscribe().is_err());
/// # }
/// ```
pub struct UnicastQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for UnicastQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + 'static> UnicastQueue<T> {
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_window(usize::MAX, usize::MAX)
    }

    /// A queue holding at most `capacity` undelivered items.
    ///
    /// [`send`](Self::send) waits for room; [`next`](Self::next) fails with
    /// [`QueueError::Full`]. A capacity of zero is treated as one.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self::with_window(capacity, capacity - 1)
    }

    /// A bounded queue with hysteresis.
    ///
    /// Once `capacity` items are waiting, producers stay blocked until the consumer
    /// has drained the queue down to `resume_at` items.
    #[must_use]
    pub fn windowed(capacity: usize, resume_at: usize) -> Self {
        let capacity = capacity.max(1);
        Self::with_window(capacity, resume_at.min(capacity - 1))
    }

    fn with_window(capacity: usize, resume_at: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(UnicastState {
                    buffer: VecDeque::new(),
                    capacity,
                    resume_at,
                    paused: false,
                    terminal: None,
                    subscribed: false,
                    detached: false,
                    waker: None,
                }),
                space: Event::new(),
                fill: Mutex::new(None),
            }),
        }
    }

    /// Opens the one and only cursor.
    ///
    /// # Errors
    ///
    /// [`QueueError::AlreadySubscribed`] on every call after the first.
    pub fn subscribe(&self) -> Result<UnicastCursor<T>, QueueError> {
        let mut state = self.shared.state.lock();
        if state.subscribed {
            return Err(QueueError::AlreadySubscribed);
        }
        state.subscribed = true;

        Ok(UnicastCursor {
            shared: self.shared.clone(),
            done: false,
        })
    }

    /// Creates a queue together with its cursor, for private push/pull bridges.
    ///
    /// `capacity` of `None` is unbounded.
    #[must_use]
    pub fn bridge(capacity: Option<usize>) -> (Self, UnicastCursor<T>) {
        let queue = match capacity {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        };
        queue.shared.state.lock().subscribed = true;
        let cursor = UnicastCursor {
            shared: queue.shared.clone(),
            done: false,
        };
        (queue, cursor)
    }

    /// Pushes an item without waiting.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] after a terminal signal or once the cursor is gone,
    /// [`QueueError::Full`] when a bounded queue has no room.
    pub fn next(&self, item: T) -> Result<(), QueueError> {
        self.try_push(item).map_err(|(error, _)| error)
    }

    fn try_push(&self, item: T) -> Result<(), (QueueError, T)> {
        let waker = {
            let mut state = self.shared.state.lock();
            if let Err(error) = state.check_open() {
                return Err((error, item));
            }
            if !state.subscribed {
                return Ok(());
            }
            if !state.has_space() {
                return Err((QueueError::Full, item));
            }
            state.buffer.push_back(item);
            state.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
        Ok(())
    }

    /// Waits until the queue accepts another item.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] after a terminal signal or once the cursor is gone.
    pub async fn ready(&self) -> Result<(), QueueError> {
        loop {
            let listener = {
                let mut state = self.shared.state.lock();
                state.check_open()?;
                if !state.subscribed || state.has_space() {
                    return Ok(());
                }
                // Registered under the lock so a concurrent pop cannot be missed
                self.shared.space.listen()
            };

            listener.await;
        }
    }

    /// Pushes an item, waiting for room in a bounded queue.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] after a terminal signal or once the cursor is gone.
    pub async fn send(&self, mut item: T) -> Result<(), QueueError> {
        loop {
            self.ready().await?;
            match self.try_push(item) {
                Ok(()) => return Ok(()),
                // Another producer took the free slot
                Err((QueueError::Full, rejected)) => item = rejected,
                Err((error, _)) => return Err(error),
            }
        }
    }

    pub fn error(&self, error: RivuletError) {
        self.terminate(Terminal::Failed(error));
    }

    pub fn complete(&self) {
        self.terminate(Terminal::Completed);
    }

    fn terminate(&self, terminal: Terminal) {
        let waker = {
            let mut state = self.shared.state.lock();
            if state.terminal.is_some() {
                return;
            }
            state.terminal = Some(terminal);
            state.waker.take()
        };

        self.shared.space.notify(usize::MAX);
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.state.lock().terminal.is_some()
    }

    /// `true` while an open cursor is attached and no terminal signal was set.
    #[must_use]
    pub fn has_consumers(&self) -> bool {
        let state = self.shared.state.lock();
        state.subscribed && !state.detached && state.terminal.is_none()
    }

    /// Either 0 or 1.
    #[must_use]
    pub fn consumer_count(&self) -> usize {
        usize::from(self.has_consumers())
    }

    /// Number of items pushed but not yet taken by the cursor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `source` into this queue from a background task.
    ///
    /// The source is only pulled while the queue has room, so a bounded queue
    /// doubles as a read-ahead window. A source error fails the queue, the end of
    /// the source completes it. The task stops once no queue handle and no cursor
    /// remain; installing a new source cancels the previous fill task.
    ///
    /// Subscribe before filling: items pushed ahead of the cursor are discarded.
    pub fn fill_from<S>(&self, source: S)
    where
        S: Stream<Item = StreamItem<T>> + Send + 'static,
    {
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        let task = RivuletTask::spawn(move |cancel| async move {
            let mut source = Box::pin(source);
            loop {
                let Some(queue) = weak.upgrade().map(|shared| UnicastQueue { shared }) else {
                    break;
                };
                let item = match select(
                    Box::pin(async {
                        queue.ready().await?;
                        Ok::<_, QueueError>(source.next().await)
                    }),
                    cancel.cancelled(),
                )
                .await
                {
                    Either::Left((Ok(item), _)) => item,
                    Either::Left((Err(_), _)) | Either::Right(_) => break,
                };
                match item {
                    Some(StreamItem::Value(value)) => {
                        if queue.next(value).is_err() {
                            break;
                        }
                    }
                    Some(StreamItem::Error(error)) => {
                        queue.error(error);
                        break;
                    }
                    None => {
                        queue.complete();
                        break;
                    }
                }
            }
            debug!("unicast fill loop finished");
        });

        *self.shared.fill.lock() = Some(task);
    }
}

/// The single cursor of a [`UnicastQueue`].
pub struct UnicastCursor<T> {
    shared: Arc<Shared<T>>,
    done: bool,
}

impl<T> Stream for UnicastCursor<T> {
    type Item = StreamItem<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let mut state = self.shared.state.lock();
        if let Some(item) = state.buffer.pop_front() {
            drop(state);
            self.shared.space.notify(1);
            return Poll::Ready(Some(StreamItem::Value(item)));
        }

        match state.terminal.take() {
            Some(Terminal::Failed(error)) => {
                state.terminal = Some(Terminal::Completed);
                drop(state);
                self.done = true;
                Poll::Ready(Some(StreamItem::Error(error)))
            }
            Some(Terminal::Completed) => {
                state.terminal = Some(Terminal::Completed);
                drop(state);
                self.done = true;
                Poll::Ready(None)
            }
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> Drop for UnicastCursor<T> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.detached = true;
            state.buffer.clear();
            state.waker = None;
        }
        self.shared.space.notify(usize::MAX);
        // The fill loop holds the queue while it waits on its source
        let fill = self.shared.fill.lock().take();
        drop(fill);
    }
}
