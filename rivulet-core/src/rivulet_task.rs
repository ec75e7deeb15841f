// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Background task spawning with cooperative cancellation.
//!
//! Operators that must keep pulling a source while the consumer is elsewhere
//! (queue fill loops, merge drivers, routers, read-ahead windows) run their loop
//! in a [`RivuletTask`]. Dropping the task cancels its token; the loop observes
//! the token at its next suspension point and drops every cursor it still owns.

use crate::CancellationToken;
use core::future::Future;

#[derive(Debug)]
pub struct RivuletTask {
    cancel: CancellationToken,
}

impl RivuletTask {
    /// Spawns `f(token)` on the ambient tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let future = f(cancel.clone());
        tokio::spawn(future);

        Self { cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for RivuletTask {
    fn drop(&mut self) {
        debug!("rivulet task dropped, signalling cancellation");
        self.cancel.cancel();
    }
}
