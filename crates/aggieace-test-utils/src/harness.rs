// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for queue and service integration tests.
//!
//! `TestHarness` wires a [`RateLimiter`], [`JobQueue`] and
//! [`ConversionService`] to a [`MockConverter`] and a [`MemoryCache`], and
//! keeps a temp directory for uploaded documents.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use aggieace_config::model::{QueueConfig, RateLimitConfig};
use aggieace_core::{AggieError, CacheStore, ClassMetadata, Converter, JobId, JobStatus};
use aggieace_queue::{ConversionService, ConversionWorker, JobQueue, JobSnapshot, RateLimiter};

use crate::mock_cache::MemoryCache;
use crate::mock_converter::MockConverter;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    rate_limit: RateLimitConfig,
    queue: QueueConfig,
    converter: MockConverter,
    start_scheduler: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            queue: QueueConfig::default(),
            converter: MockConverter::new(),
            start_scheduler: true,
        }
    }

    /// Set the daily and per-minute call budgets.
    pub fn with_rate_limits(mut self, per_day: u32, per_minute: u32) -> Self {
        self.rate_limit = RateLimitConfig {
            max_calls_per_day: per_day,
            max_calls_per_minute: per_minute,
        };
        self
    }

    /// Set how long terminal jobs stay queryable.
    pub fn with_retention_secs(mut self, secs: u64) -> Self {
        self.queue.job_retention_secs = secs;
        self
    }

    /// Set the conversion watchdog.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.queue.conversion_timeout_secs = secs;
        self
    }

    /// Use a specific mock converter.
    pub fn with_converter(mut self, converter: MockConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Do not spawn the window reset scheduler; resets must be triggered by
    /// hand.
    pub fn without_scheduler(mut self) -> Self {
        self.start_scheduler = false;
        self
    }

    /// Build the harness. Must run inside a tokio runtime.
    pub async fn build(self) -> Result<TestHarness, AggieError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| AggieError::Internal(e.to_string()))?;

        let limiter = Arc::new(RateLimiter::new(self.rate_limit));
        let converter = Arc::new(self.converter);
        let cache = Arc::new(MemoryCache::new());

        let worker = ConversionWorker::new(
            converter.clone() as Arc<dyn Converter>,
            self.queue.conversion_timeout(),
        );
        let queue = JobQueue::new(
            limiter.clone(),
            worker,
            cache.clone() as Arc<dyn CacheStore>,
            &self.queue,
        );
        let service = ConversionService::new(queue.clone(), cache.clone());

        let shutdown = CancellationToken::new();
        if self.start_scheduler {
            queue.start(shutdown.clone());
        }

        Ok(TestHarness {
            service,
            queue,
            limiter,
            converter,
            cache,
            shutdown,
            temp_dir,
        })
    }
}

/// A fully wired queue stack backed by mocks.
pub struct TestHarness {
    pub service: ConversionService,
    pub queue: Arc<JobQueue>,
    pub limiter: Arc<RateLimiter>,
    pub converter: Arc<MockConverter>,
    pub cache: Arc<MemoryCache>,
    pub shutdown: CancellationToken,
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start building a test environment.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Write a document into the harness temp dir and return its path.
    pub async fn write_document(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        tokio::fs::write(&path, bytes)
            .await
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
        path
    }

    /// Metadata for a fall semester section.
    pub fn metadata(&self) -> ClassMetadata {
        ClassMetadata::parse(
            "CSCE 311",
            "546",
            "08/25/2025",
            "12/16/2025",
            "America/Chicago",
        )
        .unwrap_or_else(|e| panic!("fixture metadata is valid: {e}"))
    }

    /// Poll until the job reaches `status`, yielding virtual or real time in
    /// small steps. Panics after `limit` of waiting.
    pub async fn wait_for_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        limit: Duration,
    ) -> JobSnapshot {
        let step = Duration::from_millis(10);
        let mut waited = Duration::ZERO;
        loop {
            if let Some(snapshot) = self.queue.status(job_id)
                && snapshot.status == status
            {
                return snapshot;
            }
            if waited >= limit {
                panic!(
                    "job {job_id} did not reach {status} within {limit:?}; last: {:?}",
                    self.queue.status(job_id).map(|s| s.status)
                );
            }
            tokio::time::sleep(step).await;
            waited += step;
        }
    }

    /// Let spawned tasks run without moving the clock far.
    pub async fn settle(&self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
