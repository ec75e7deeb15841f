// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Push-driven sinks exposing pull-based streams.
//!
//! | queue | cursors | history |
//! |---|---|---|
//! | [`UnicastQueue`] | exactly one | none |
//! | [`MulticastQueue`] | any number | none, each cursor starts at its attach point |
//! | [`ReplayQueue`] | any number | retained buffer bounded by count and/or age |
//!
//! Producers call `next`, `error` and `complete`; every mutation of the shared
//! state happens under a single lock. `error` and `complete` after a terminal
//! signal are no-ops. A queue can also be fed from a source stream with
//! `fill_from`, which runs a background task for as long as the queue is reachable.

mod broadcast;
mod multicast;
mod replay;
mod unicast;

pub use broadcast::BroadcastCursor;
pub use multicast::MulticastQueue;
pub use replay::{ReplayConfig, ReplayQueue};
pub use unicast::{UnicastCursor, UnicastQueue};

use crate::RivuletError;

/// Terminal slot shared by all queue flavours.
#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Completed,
    Failed(RivuletError),
}
