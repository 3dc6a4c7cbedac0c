// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`CacheStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use aggieace_config::model::StorageConfig;
use aggieace_core::types::now_timestamp;
use aggieace_core::{AggieError, CacheEntry, CacheStore, Fingerprint, HealthStatus};

use crate::database::Database;
use crate::queries;

/// SQLite-backed result cache.
///
/// The database is opened lazily by [`SqliteCache::initialize`].
pub struct SqliteCache {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteCache {
    /// Create a cache for the configured database. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, AggieError> {
        self.db.get().ok_or_else(|| AggieError::Storage {
            source: "cache not initialized -- call initialize() first".into(),
        })
    }

    /// Open the database and apply migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), AggieError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AggieError::Storage {
            source: "cache already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite cache initialized");
        Ok(())
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), AggieError> {
        self.db()?.checkpoint().await
    }

    /// Run an integrity check and confirm the journal mode.
    ///
    /// A failed integrity check is unhealthy. A file database that lost WAL
    /// mode while `wal_mode` is configured still works but is degraded.
    pub async fn health_check(&self) -> Result<HealthStatus, AggieError> {
        let db = self.db()?;
        let (integrity, journal_mode) = db
            .connection()
            .call(|conn| -> Result<(String, String), rusqlite::Error> {
                let integrity: String =
                    conn.query_row("PRAGMA quick_check;", [], |row| row.get(0))?;
                let journal_mode: String =
                    conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
                Ok((integrity, journal_mode))
            })
            .await
            .map_err(crate::database::map_tr_err)?;

        if integrity != "ok" {
            return Ok(HealthStatus::Unhealthy(format!("integrity check: {integrity}")));
        }
        if self.config.wal_mode
            && self.config.database_path != ":memory:"
            && !journal_mode.eq_ignore_ascii_case("wal")
        {
            return Ok(HealthStatus::Degraded(format!(
                "journal mode is {journal_mode}, expected wal"
            )));
        }
        Ok(HealthStatus::Healthy)
    }

    /// Number of cached calendars.
    pub async fn count(&self) -> Result<u64, AggieError> {
        queries::cache::count_cached(self.db()?).await
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, AggieError> {
        queries::cache::find_cached(self.db()?, fingerprint).await
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        calendar_text: &str,
        source_path: Option<&str>,
    ) -> Result<(), AggieError> {
        queries::cache::save_cached(
            self.db()?,
            fingerprint,
            calendar_text,
            source_path,
            &now_timestamp(),
        )
        .await?;
        debug!(fingerprint = %fingerprint, "calendar cached");
        Ok(())
    }
}
