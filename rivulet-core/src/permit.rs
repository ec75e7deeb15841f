// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Counting gate bounding how many inner sequences run at once.
//!
//! A [`PermitGuard`] is handed out per acquisition and returns its permit when
//! dropped, whether the guarded work completed, failed or was abandoned.

use core::sync::atomic::{AtomicUsize, Ordering};
use event_listener::Event;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct PermitCounter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    available: AtomicUsize,
    limit: usize,
    released: Event,
}

impl PermitCounter {
    /// Creates a counter with `limit` permits. `usize::MAX` means unbounded.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                available: AtomicUsize::new(limit),
                limit,
                released: Event::new(),
            }),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    pub fn available(&self) -> usize {
        self.inner.available.load(Ordering::Acquire)
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.inner.limit - self.available()
    }

    pub fn try_acquire(&self) -> Option<PermitGuard> {
        let mut current = self.inner.available.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return None;
            }
            match self.inner.available.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    return Some(PermitGuard {
                        inner: self.inner.clone(),
                    })
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Waits until a permit is free.
    pub async fn acquire(&self) -> PermitGuard {
        loop {
            if let Some(guard) = self.try_acquire() {
                return guard;
            }

            let listener = self.inner.released.listen();

            // A release may have landed before the listener was registered
            if let Some(guard) = self.try_acquire() {
                return guard;
            }

            listener.await;
        }
    }
}

#[derive(Debug)]
#[must_use = "the permit is released as soon as the guard is dropped"]
pub struct PermitGuard {
    inner: Arc<Inner>,
}

impl Drop for PermitGuard {
    fn drop(&mut self) {
        self.inner.available.fetch_add(1, Ordering::AcqRel);
        self.inner.released.notify(1);
    }
}
