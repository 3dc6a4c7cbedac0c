// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request entry point: fingerprint, consult the cache, then queue.

use std::path::Path;
use std::sync::Arc;

use aggieace_core::{AggieError, CacheEntry, CacheStore, ClassMetadata, JobId, JobParams};
use tracing::{debug, info, warn};

use crate::hasher::fingerprint_file;
use crate::queue::{JobQueue, JobSnapshot, QueueStats, SubmitReceipt};

/// Outcome of [`ConversionService::request`].
#[derive(Debug, Clone)]
pub enum Submission {
    /// The document was converted before; no job was created.
    Cached(CacheEntry),
    /// A job was admitted to the queue.
    Queued(SubmitReceipt),
}

/// Facade used by the outer layers (CLI, HTTP).
#[derive(Clone)]
pub struct ConversionService {
    queue: Arc<JobQueue>,
    cache: Arc<dyn CacheStore>,
}

impl ConversionService {
    pub fn new(queue: Arc<JobQueue>, cache: Arc<dyn CacheStore>) -> Self {
        Self { queue, cache }
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Convert `document_path`, reusing a cached calendar when the same bytes
    /// were converted before.
    ///
    /// Hashing failures abort the request. Cache read failures are treated
    /// as a miss. A hit neither touches the queue nor spends rate budget.
    pub async fn request(
        &self,
        document_path: &Path,
        metadata: ClassMetadata,
    ) -> Result<Submission, AggieError> {
        let fingerprint = fingerprint_file(document_path).await?;

        match self.cache.lookup(&fingerprint).await {
            Ok(Some(entry)) => {
                info!(fingerprint = %fingerprint, "cache hit");
                return Ok(Submission::Cached(entry));
            }
            Ok(None) => debug!(fingerprint = %fingerprint, "cache miss"),
            Err(e) => warn!(
                fingerprint = %fingerprint,
                error = %e,
                "cache lookup failed; treating as miss"
            ),
        }

        let receipt = self.queue.submit(JobParams {
            document_path: document_path.to_path_buf(),
            fingerprint,
            metadata,
        });
        Ok(Submission::Queued(receipt))
    }

    pub fn status(&self, job_id: &JobId) -> Option<JobSnapshot> {
        self.queue.status(job_id)
    }

    pub fn cancel(&self, job_id: &JobId) -> bool {
        self.queue.cancel(job_id)
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }
}
