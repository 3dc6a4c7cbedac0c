// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the AggieAce syllabus-to-calendar pipeline.
//!
//! This crate provides the error type, the domain types that flow between
//! the cache, the job queue and the converters, and the two seam traits
//! ([`CacheStore`] and [`Converter`]) that the queue is written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AggieError;
pub use traits::{CacheStore, Converter};
pub use types::{
    CacheEntry, ClassMetadata, ConversionOutput, Fingerprint, HealthStatus, JobId, JobParams,
    JobStatus,
};
