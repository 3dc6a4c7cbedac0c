// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `aggieace cache`: inspect the result cache.

use std::path::Path;

use aggieace_config::model::StorageConfig;
use aggieace_core::{AggieError, CacheEntry, CacheStore, HealthStatus};
use aggieace_queue::fingerprint_file;
use aggieace_storage::SqliteCache;

/// Cache size and backend health.
#[derive(Debug)]
pub struct CacheStats {
    pub entries: u64,
    pub health: HealthStatus,
}

async fn open(config: &StorageConfig) -> Result<SqliteCache, AggieError> {
    let cache = SqliteCache::new(config.clone());
    cache.initialize().await?;
    Ok(cache)
}

/// Look up the cached calendar for the bytes of `document`.
pub async fn lookup(config: &StorageConfig, document: &Path) -> Result<Option<CacheEntry>, AggieError> {
    let fingerprint = fingerprint_file(document).await?;
    let cache = open(config).await?;
    cache.lookup(&fingerprint).await
}

pub async fn stats(config: &StorageConfig) -> Result<CacheStats, AggieError> {
    let cache = open(config).await?;
    let health = cache.health_check().await?;
    let entries = cache.count().await?;
    Ok(CacheStats { entries, health })
}
