// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::RivuletError;
use core::fmt;

/// Producer- and subscriber-side failures of the broadcast queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue reached a terminal signal or its only consumer went away.
    Closed,
    /// A unicast queue was subscribed a second time.
    AlreadySubscribed,
    /// A bounded unicast queue has no room and the caller did not wait.
    Full,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Queue is closed"),
            Self::AlreadySubscribed => write!(f, "Unicast queue already has a consumer"),
            Self::Full => write!(f, "Queue is full"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<QueueError> for RivuletError {
    fn from(error: QueueError) -> Self {
        RivuletError::invalid_state(error.to_string())
    }
}
