// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fan-in of many rivulet streams into one.
//!
//! Two concurrent policies are offered:
//!
//! - **aggregate-all-errors** ([`MergeAllExt::merge_concurrently`]): every source runs
//!   to its own end; the output fails only after all of them finished, carrying the
//!   single captured error or a [`RivuletError::MultipleErrors`] in failure order.
//! - **fail-fast** ([`MergeAllExt::merge_concurrently_until_first_error`]): the first
//!   failure fails the output and the remaining sources are dropped.
//!
//! [`MergeAllExt::merge_sequentially`] concatenates instead, draining one source
//! before opening the next.
//!
//! Only per-source order is preserved by the concurrent variants. A
//! [`RivuletError::Cancelled`] from any source ends the output at once and is never
//! aggregated.
//!
//! [`RivuletError::MultipleErrors`]: rivulet_core::RivuletError::MultipleErrors
//! [`RivuletError::Cancelled`]: rivulet_core::RivuletError::Cancelled

#[macro_use]
mod logging;

pub mod merge_engine;
pub mod merge_ext;
pub mod merge_options;
pub mod sequential_merge;

pub use merge_engine::{merge_with_options, MergedStream};
pub use merge_ext::{
    merge_concurrently, merge_concurrently_until_first_error, merge_sequentially, MergeAllExt,
    MergeWithExt,
};
pub use merge_options::{ErrorPolicy, MergeOptions};
pub use sequential_merge::SequentialMerge;
