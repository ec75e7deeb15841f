// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::doc_markdown)]
//! Error types for the rivulet operator library
//!
//! Every failure travelling through a pipeline is a [`RivuletError`] carried in-band
//! as `StreamItem::Error`. The variants separate upstream failures, cancellation,
//! misuse and aggregates, because operators treat each of them differently.
//!
//! # Examples
//!
//! ```
//! use rivulet_core::{Result, RivuletError};
//!
//! fn open_window(size: usize) -> Result<usize> {
//!     if size == 0 {
//!         return Err(RivuletError::invalid_state("window size must be positive"));
//!     }
//!     Ok(size)
//! }
//!
//! assert!(open_window(0).is_err());
//! ```

/// Root error type for all rivulet operations
#[derive(Debug, thiserror::Error)]
pub enum RivuletError {
    /// A source sequence failed
    ///
    /// General upstream failure described by a message.
    #[error("Stream processing error: {context}")]
    StreamProcessingError {
        /// Description of what went wrong
        context: String,
    },

    /// Custom error from user code
    ///
    /// Wraps errors produced by user-provided sources, mappers and handlers.
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The operation was cancelled through a cancellation token
    ///
    /// Never folded into an aggregate and swallowed during disposal.
    #[error("Operation cancelled")]
    Cancelled,

    /// An operator was misused or misconfigured
    #[error("Invalid state: {context}")]
    InvalidState {
        /// What was invalid
        context: String,
    },

    /// Several failures were captured before the output terminated
    ///
    /// Errors keep the order in which they occurred.
    #[error("Multiple errors occurred: {count} errors")]
    MultipleErrors {
        /// Number of errors that occurred
        count: usize,
        /// The individual errors
        errors: Vec<RivuletError>,
    },
}

impl RivuletError {
    /// Create a stream processing error with the given context
    pub fn stream_error(context: impl Into<String>) -> Self {
        Self::StreamProcessingError {
            context: context.into(),
        }
    }

    /// Create an invalid state error with the given context
    pub fn invalid_state(context: impl Into<String>) -> Self {
        Self::InvalidState {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Combine captured errors into one.
    ///
    /// Nested aggregates are flattened. A single cause is returned unchanged, so
    /// `MultipleErrors` wraps two or more errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use rivulet_core::RivuletError;
    ///
    /// let single = RivuletError::aggregate(vec![RivuletError::stream_error("a")]);
    /// assert!(matches!(single, RivuletError::StreamProcessingError { .. }));
    ///
    /// let many = RivuletError::aggregate(vec![
    ///     RivuletError::stream_error("a"),
    ///     RivuletError::stream_error("b"),
    /// ]);
    /// assert!(matches!(many, RivuletError::MultipleErrors { count: 2, .. }));
    /// ```
    pub fn aggregate(errors: Vec<RivuletError>) -> Self {
        let mut flat = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                Self::MultipleErrors { errors, .. } => flat.extend(errors),
                other => flat.push(other),
            }
        }

        if flat.len() == 1 {
            if let Some(single) = flat.pop() {
                return single;
            }
        }

        Self::MultipleErrors {
            count: flat.len(),
            errors: flat,
        }
    }

    /// Aggregate multiple user errors into a `MultipleErrors` variant
    pub fn from_user_errors<E>(errors: Vec<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::aggregate(errors.into_iter().map(Self::user_error).collect())
    }

    /// Check if this error came from a cancellation token
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error is a failure produced by a source or user code
    #[must_use]
    pub const fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::StreamProcessingError { .. } | Self::UserError(_)
        )
    }

    /// Number of causes carried by this error
    #[must_use]
    pub fn cause_count(&self) -> usize {
        match self {
            Self::MultipleErrors { count, .. } => *count,
            _ => 1,
        }
    }
}

/// Specialized Result type for rivulet operations
pub type Result<T> = std::result::Result<T, RivuletError>;

/// Extension trait for converting errors into `RivuletError`
pub trait IntoRivuletError {
    /// Convert this error into a `RivuletError` with additional context
    fn into_rivulet_error(self, context: &str) -> RivuletError;

    /// Convert this error into a `RivuletError` without additional context
    fn into_rivulet(self) -> RivuletError
    where
        Self: Sized,
    {
        self.into_rivulet_error("")
    }
}

impl<E: std::error::Error + Send + Sync + 'static> IntoRivuletError for E {
    fn into_rivulet_error(self, context: &str) -> RivuletError {
        if context.is_empty() {
            RivuletError::user_error(self)
        } else {
            RivuletError::stream_error(format!("{context}: {self}"))
        }
    }
}

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(RivuletError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(RivuletError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

fn attach_context(error: RivuletError, context: String) -> RivuletError {
    match error {
        RivuletError::UserError(inner) => RivuletError::StreamProcessingError {
            context: format!("{context}: {inner}"),
        },
        other => other,
    }
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<RivuletError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach_context(e.into(), context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach_context(e.into(), f()))
    }
}

impl Clone for RivuletError {
    fn clone(&self) -> Self {
        match self {
            Self::StreamProcessingError { context } => Self::StreamProcessingError {
                context: context.clone(),
            },
            // The boxed source cannot be cloned; keep its message
            Self::UserError(e) => Self::StreamProcessingError {
                context: format!("User error: {e}"),
            },
            Self::Cancelled => Self::Cancelled,
            Self::InvalidState { context } => Self::InvalidState {
                context: context.clone(),
            },
            Self::MultipleErrors { count, errors } => Self::MultipleErrors {
                count: *count,
                errors: errors.clone(),
            },
        }
    }
}
