// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result-cache trait for fingerprint-keyed calendar storage.

use async_trait::async_trait;

use crate::error::AggieError;
use crate::types::{CacheEntry, Fingerprint};

/// Persistent map from document fingerprint to generated calendar text.
///
/// Implementations must upsert on `store`: a repeated write for the same
/// fingerprint replaces the previous content. Entries never expire.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the entry for `fingerprint`, if one has been stored.
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, AggieError>;

    /// Inserts or replaces the entry for `fingerprint`.
    async fn store(
        &self,
        fingerprint: &Fingerprint,
        calendar_text: &str,
        source_path: Option<&str>,
    ) -> Result<(), AggieError>;
}
