// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;

pub mod cancellation_token;
pub mod permit;
pub mod queue;
pub mod queue_error;
pub mod rivulet_error;
pub mod rivulet_task;
pub mod stream_item;

pub use self::cancellation_token::{CancellationToken, Cancelled, CancelledOwned};
pub use self::permit::{PermitCounter, PermitGuard};
pub use self::queue::{
    BroadcastCursor, MulticastQueue, ReplayConfig, ReplayQueue, UnicastCursor, UnicastQueue,
};
pub use self::queue_error::QueueError;
pub use self::rivulet_error::{IntoRivuletError, Result, ResultExt, RivuletError};
pub use self::rivulet_task::RivuletTask;
pub use self::stream_item::StreamItem;
