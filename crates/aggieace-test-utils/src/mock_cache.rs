// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory result cache with switchable failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use aggieace_core::types::now_timestamp;
use aggieace_core::{AggieError, CacheEntry, CacheStore, Fingerprint};

/// A [`CacheStore`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    fail_lookups: AtomicBool,
    fail_stores: AtomicBool,
    lookups: AtomicUsize,
    stores: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent lookup return a storage error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent store return a storage error.
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }

    /// Seed an entry directly, bypassing the failure switches.
    pub async fn insert(&self, fingerprint: Fingerprint, calendar_text: &str) {
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            calendar_text: calendar_text.to_string(),
            source_path: None,
            created_at: now_timestamp(),
        };
        self.entries.lock().await.insert(fingerprint, entry);
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        self.entries.lock().await.get(fingerprint).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>, AggieError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AggieError::Storage {
                source: "injected lookup failure".into(),
            });
        }
        Ok(self.get(fingerprint).await)
    }

    async fn store(
        &self,
        fingerprint: &Fingerprint,
        calendar_text: &str,
        source_path: Option<&str>,
    ) -> Result<(), AggieError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(AggieError::Storage {
                source: "injected store failure".into(),
            });
        }
        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            calendar_text: calendar_text.to_string(),
            source_path: source_path.map(str::to_string),
            created_at: now_timestamp(),
        };
        self.entries.lock().await.insert(fingerprint.clone(), entry);
        Ok(())
    }
}
