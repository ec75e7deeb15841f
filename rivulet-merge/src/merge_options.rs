// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_core::PermitCounter;

/// How a concurrent merge reacts to a failing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Keep every source running; fail at the end with all captured errors.
    #[default]
    AggregateAll,
    /// Fail on the first error and drop the other sources.
    FailFast,
}

/// Construction-time options of the concurrent merge engine.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub policy: ErrorPolicy,
    /// Gate acquired before each inner source is opened and held until it ends.
    pub permits: Option<PermitCounter>,
    /// Bound on merged items waiting for the consumer. `None` is unbounded.
    pub output_capacity: Option<usize>,
}

impl MergeOptions {
    #[must_use]
    pub fn aggregate() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            policy: ErrorPolicy::FailFast,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_permits(mut self, permits: PermitCounter) -> Self {
        self.permits = Some(permits);
        self
    }

    #[must_use]
    pub fn with_max_concurrency(self, max_concurrency: usize) -> Self {
        self.with_permits(PermitCounter::new(max_concurrency))
    }

    #[must_use]
    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = Some(capacity);
        self
    }
}
