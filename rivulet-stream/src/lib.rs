// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Flattening, splitting, sharing and lifecycle operators for rivulet streams.
//!
//! # Overview
//!
//! - **[`PrefetchExt`]** - `.prefetch(config)`: bounded read-ahead with a low-water mark
//! - **[`FlatMapExt`]** - `.flat_map(mapper, config)` and `.for_each_concurrently(n, f)`:
//!   inner streams merged under a concurrency limit
//! - **[`ConcatMapEagerExt`]** / **[`ConcatEagerExt`]** - inner streams started ahead,
//!   emitted strictly in upstream order
//! - **[`IfElseExt`]** - `.if_else(predicate, if_branch, else_branch)`: route values
//!   through two sub-pipelines and merge them back
//! - **[`SwitchMapExt`]** / **[`SwitchExt`]** - follow only the newest inner stream
//! - **[`ToQueueExt`]** - copy a stream into a multicast or replay queue
//! - **[`PublishExt`]** - `.publish(selector)` / `.replay(config, selector)`: share one
//!   upstream subscription among the cursors a selector takes
//! - **[`PushToExt`]** - record passing values into a shared `Vec` or `VecDeque`
//! - **[`WithCancellationExt`]** - end a stream with `Cancelled` when a token fires
//! - **[`DoOnDisposeExt`]** - run a fallible cleanup action exactly once
//! - [`factories`] - `just`, `empty`, `never`, `from_iter`, `range`, `fail`
//!
//! Operators that spawn background work need a tokio runtime when they start.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
#[macro_use]
mod logging;

mod concat_map_eager;
mod do_on_dispose;
pub mod factories;
mod flat_map;
mod if_else;
mod prefetch;
mod publish;
mod push_to;
mod switch_map;
mod to_queue;
mod with_cancellation;

pub mod prelude;

pub use concat_map_eager::{
    ConcatEagerExt, ConcatMapEager, ConcatMapEagerConfig, ConcatMapEagerExt,
};
pub use do_on_dispose::{DoOnDispose, DoOnDisposeExt};
pub use flat_map::{FlatMap, FlatMapConfig, FlatMapExt};
pub use if_else::{IfElse, IfElseExt};
pub use prefetch::{Prefetch, PrefetchConfig, PrefetchExt};
pub use publish::{Publish, PublishExt};
pub use push_to::{PushTarget, PushTo, PushToExt};
pub use switch_map::{SwitchExt, SwitchMap, SwitchMapExt};
pub use to_queue::ToQueueExt;
pub use with_cancellation::{WithCancellation, WithCancellationExt};
