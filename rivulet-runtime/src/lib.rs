// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Timer abstraction used by every time-aware rivulet operator.
//!
//! Operators are written against [`timer::Timer`] and pick up [`DefaultTimer`]
//! through their extension traits.

pub mod impls;
pub mod timer;

#[cfg(feature = "runtime-tokio")]
pub use impls::tokio::TokioTimer;

/// Timer selected by the enabled runtime feature.
#[cfg(feature = "runtime-tokio")]
pub type DefaultTimer = TokioTimer;
