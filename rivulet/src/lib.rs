// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Rivulet
//!
//! Pull-based reactive streams with explicit concurrency, backpressure and
//! cancellation.
//!
//! ## Overview
//!
//! Every rivulet stream is a `futures::Stream<Item = StreamItem<T>>`: values and a
//! terminal in-band error travel on the same channel, the end of the stream is
//! completion and dropping a stream disposes everything it started.
//!
//! - **Broadcast queues** ([`UnicastQueue`], [`MulticastQueue`], [`ReplayQueue`])
//!   turn producer calls into cursor streams.
//! - **Merge** ([`MergeAllExt`], [`merge_concurrently`], ...) fans many streams
//!   into one, aggregating failures or failing fast.
//! - **Time** ([`DebounceExt`], [`SampleExt`], [`BufferExt`], [`interval`], ...)
//!   race items against a [`Timer`].
//! - **Flattening** ([`FlatMapExt`], [`ConcatMapEagerExt`], [`PrefetchExt`]) bounds
//!   how many inner streams run and how far they read ahead.
//! - **Routing** ([`IfElseExt`]) splits a stream into two pipelines and merges them
//!   back.
//!
//! ## Quick Start
//!
//! ```rust
//! use futures::StreamExt;
//! use rivulet::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let readings = rivulet::factories::from_iter(vec![3, 8, 1, 9]);
//! let routed: Vec<_> = readings
//!     .if_then(
//!         |reading| *reading > 5,
//!         |high| {
//!             high.buffer(2, Duration::from_secs(1))
//!                 .map(|batch| batch.map(|values| values.into_iter().sum::<i32>()))
//!         },
//!     )
//!     .collect()
//!     .await;
//!
//! // 3 and 1 pass through, 8 and 9 arrive as one summed batch
//! assert_eq!(routed.len(), 3);
//! # }
//! ```
//!
//! [`Timer`]: rivulet_runtime::timer::Timer

pub mod receiver_ext;

pub use rivulet_core::{
    BroadcastCursor, CancellationToken, MulticastQueue, PermitCounter, PermitGuard, QueueError,
    ReplayConfig, ReplayQueue, Result, RivuletError, RivuletTask, StreamItem, UnicastCursor,
    UnicastQueue,
};
pub use rivulet_merge::{
    merge_concurrently, merge_concurrently_until_first_error, merge_sequentially,
    merge_with_options, MergeAllExt, MergeOptions, MergeWithExt, MergedStream,
};
pub use rivulet_runtime::timer::Timer;
pub use rivulet_stream::factories;
pub use rivulet_stream::{
    ConcatEagerExt, ConcatMapEagerConfig, ConcatMapEagerExt, DoOnDisposeExt, FlatMapConfig,
    FlatMapExt, IfElseExt, PrefetchConfig, PrefetchExt, PublishExt, PushTarget, PushToExt,
    SwitchExt, SwitchMapExt, ToQueueExt, WithCancellationExt,
};
pub use rivulet_stream_time::{
    BufferExt, DebounceExt, DelayExt, RemoveTimestampExt, SampleExt, TimestampExt, Timestamped,
};

#[cfg(feature = "runtime-tokio")]
pub use rivulet_stream_time::{interval, interval_range, interval_with_delay, timer};

pub use receiver_ext::{ReceiverExt, UnboundedReceiverExt};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::receiver_ext::{ReceiverExt, UnboundedReceiverExt};
    pub use rivulet_core::{RivuletError, StreamItem};
    pub use rivulet_merge::{MergeAllExt, MergeWithExt};
    pub use rivulet_stream::prelude::*;
    pub use rivulet_stream_time::prelude::*;
}
