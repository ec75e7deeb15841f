// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::fmt::Debug;
use core::future::Future;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A cancellable delayed-completion primitive plus a monotonic clock.
///
/// Dropping a `Sleep` before it resolves cancels the wait.
pub trait Timer: Clone + Default + Send + Sync + Debug + 'static {
    type Sleep: Future<Output = ()> + Send;

    type Instant: Copy
        + Debug
        + Ord
        + Send
        + Sync
        + Add<Duration, Output = Self::Instant>
        + Sub<Duration, Output = Self::Instant>
        + Sub<Self::Instant, Output = Duration>;

    fn sleep_future(&self, duration: Duration) -> Self::Sleep;

    fn now(&self) -> Self::Instant;

    /// Time left until `deadline`, zero when it already passed.
    fn until(&self, deadline: Self::Instant) -> Duration {
        let now = self.now();
        if deadline > now {
            deadline - now
        } else {
            Duration::ZERO
        }
    }
}
