// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the AggieAce pipeline.

use thiserror::Error;

/// The primary error type used across the cache, queue and converter crates.
///
/// Rate-limit holds and unknown job ids are not errors: the limiter reports
/// them as a `Dispatch` value and job lookups return `None`.
#[derive(Debug, Error)]
pub enum AggieError {
    /// Configuration errors surfaced after loading (invalid values, missing programs).
    #[error("configuration error: {0}")]
    Config(String),

    /// Result-cache backend errors (connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The uploaded document could not be read while fingerprinting it.
    #[error("failed to hash {path}: {source}")]
    Hashing {
        path: String,
        source: std::io::Error,
    },

    /// The external conversion failed or produced malformed output.
    #[error("conversion failed: {message}")]
    Conversion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The conversion watchdog expired.
    #[error("conversion timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Request metadata was rejected before any work was admitted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AggieError {
    /// Shorthand for a conversion failure without an underlying source.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
            source: None,
        }
    }
}
