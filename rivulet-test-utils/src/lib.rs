// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities for the rivulet operator crates.
//!
//! This crate is meant for development and tests only.
//!
//! - [`test_channel`] / [`test_channel_with_errors`]: imperative sources backed by
//!   tokio unbounded channels, so a test can push items while an operator consumes.
//! - [`scripted`]: a source replaying `(delay, item)` steps on the tokio clock, for
//!   deterministic interleavings under `tokio::time::pause`.
//! - [`TrackedStream`]: records when a source is polled to its end or dropped,
//!   to observe disposal.
//! - [`ErrorInjectingStream`]: inserts an error at a fixed position.
//! - [`helpers`]: assertions with timeouts and collectors.

pub mod error_injection;
pub mod helpers;
pub mod scripted;
pub mod test_channel;
pub mod tracked_stream;

pub use error_injection::ErrorInjectingStream;
pub use scripted::{failing, scripted, values};
pub use test_channel::{test_channel, test_channel_with_errors};
pub use tracked_stream::{DisposeTracker, TrackedStream};
