// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Converter trait for the external document-to-calendar call.

use async_trait::async_trait;

use crate::error::AggieError;
use crate::types::{ConversionOutput, JobParams};

/// Turns one uploaded document into calendar text.
///
/// A converter performs the expensive external call exactly once per
/// invocation. It never retries, never consults rate limits and never
/// touches the cache; the job queue owns all three.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the conversion for `params`.
    async fn convert(&self, params: &JobParams) -> Result<ConversionOutput, AggieError>;
}
