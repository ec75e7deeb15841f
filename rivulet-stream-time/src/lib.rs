// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Time-based operators for rivulet streams.
//!
//! Every operator races item arrival against a [`Timer`] sleep inside its own
//! `poll_next`; the losing sleep is simply dropped, which cancels it.
//!
//! # Overview
//!
//! - **[`DebounceExt`]** - `.debounce(delay, emit_last)`
//! - **[`SampleExt`]** - `.sample(period, emit_last)`, also available as `.throttle`
//! - **[`BufferExt`]** - `.buffer(max_size, max_time)` emitting `Vec<T>` batches
//! - **[`DelayExt`]** - `.delay(duration)`
//! - **[`TimestampExt`]** / **[`RemoveTimestampExt`]** - pair values with `Timer::now()`
//! - **[`interval`]**, **[`interval_with_delay`]**, **[`interval_range`]**, **[`timer`]** -
//!   periodic sources
//!
//! Each extension method has a `..._with_timer` twin taking an explicit timer; the
//! short form uses [`rivulet_runtime::DefaultTimer`].
//!
//! [`Timer`]: rivulet_runtime::timer::Timer

mod buffer;
mod debounce;
mod delay;
mod interval;
mod sample;
mod timestamped;

pub mod prelude;

/// Upstream items an operator takes in one `poll_next` before yielding back to the
/// executor. An upstream that never returns `Pending` is still read in full, one
/// slice per wake-up.
pub(crate) const MAX_ITEMS_PER_POLL: usize = 32;

pub use buffer::{Buffer, BufferExt};
pub use debounce::{Debounce, DebounceExt};
pub use delay::{Delay, DelayExt};
pub use interval::Interval;
pub use sample::{Sample, SampleExt};
pub use timestamped::{RemoveTimestampExt, Stamp, TimestampExt, Timestamped};

#[cfg(feature = "runtime-tokio")]
pub use interval::{interval, interval_range, interval_with_delay, timer};
