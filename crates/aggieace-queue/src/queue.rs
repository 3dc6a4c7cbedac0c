// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FIFO admission queue with a single in-flight job.
//!
//! Jobs move `Queued -> Processing -> Completed | Failed`, never backwards.
//! The drain step runs after every submit, every completion and every rate
//! limit reset. Its checks and the dispatch of the head job happen under one
//! lock, so concurrent triggers can never start two jobs at once.
//!
//! Lock order is queue state, then rate limiter.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use aggieace_config::model::QueueConfig;
use aggieace_core::types::now_timestamp;
use aggieace_core::{AggieError, CacheStore, ConversionOutput, JobId, JobParams, JobStatus};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::rate_limit::{Dispatch, RateLimitSnapshot, RateLimiter, duration_ms};
use crate::worker::ConversionWorker;

/// Error text recorded on a job cancelled while still queued.
pub const CANCELLED_MESSAGE: &str = "Job cancelled by user";

#[derive(Debug, Clone)]
struct Job {
    id: JobId,
    status: JobStatus,
    params: JobParams,
    created_at: String,
    completed_at: Option<String>,
    result: Option<ConversionOutput>,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: HashMap<JobId, Job>,
    order: VecDeque<JobId>,
    /// The job currently held by the worker, if any.
    processing: Option<JobId>,
}

impl QueueState {
    fn position_of(&self, id: &JobId) -> usize {
        self.order.iter().position(|queued| queued == id).unwrap_or(0)
    }
}

/// Returned by [`JobQueue::submit`].
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub job_id: JobId,
    /// Queued jobs ahead of this one at admission.
    pub position: usize,
    pub queue_length: usize,
    pub rate_limit: RateLimitSnapshot,
}

/// Returned by [`JobQueue::status`].
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Queued jobs ahead of this one; 0 once it has left the queue.
    pub position: usize,
    pub queue_length: usize,
    pub result: Option<ConversionOutput>,
    pub error: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub rate_limit: RateLimitSnapshot,
}

/// Returned by [`JobQueue::stats`].
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub queue_length: usize,
    pub is_processing: bool,
    /// Every job still in the table, terminal ones included.
    pub total_jobs: usize,
    pub rate_limit: RateLimitSnapshot,
}

/// Single-worker conversion queue.
pub struct JobQueue {
    state: Mutex<QueueState>,
    limiter: Arc<RateLimiter>,
    worker: ConversionWorker,
    cache: Arc<dyn CacheStore>,
    retention: Duration,
    this: Weak<JobQueue>,
}

impl JobQueue {
    pub fn new(
        limiter: Arc<RateLimiter>,
        worker: ConversionWorker,
        cache: Arc<dyn CacheStore>,
        config: &QueueConfig,
    ) -> Arc<Self> {
        let retention = config.job_retention();
        Arc::new_cyclic(|this| Self {
            state: Mutex::new(QueueState::default()),
            limiter,
            worker,
            cache,
            retention,
            this: this.clone(),
        })
    }

    /// Spawn the rate limit reset scheduler, wired to [`JobQueue::drain`].
    ///
    /// The task ends when `shutdown` is cancelled.
    pub fn start(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = self.limiter.clone();
        let queue = self.this.clone();
        tokio::spawn(async move {
            let wake = move || {
                if let Some(queue) = queue.upgrade() {
                    queue.drain();
                }
            };
            limiter.run_resets(wake, shutdown).await;
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a job and return without waiting for it.
    ///
    /// A drain attempt is scheduled on the runtime, so the receipt always
    /// reflects the queue as it was at admission.
    pub fn submit(&self, params: JobParams) -> SubmitReceipt {
        let job_id = JobId::new();
        let (position, queue_length) = {
            let mut state = self.lock();
            let position = state.order.len();
            state.jobs.insert(
                job_id.clone(),
                Job {
                    id: job_id.clone(),
                    status: JobStatus::Queued,
                    params,
                    created_at: now_timestamp(),
                    completed_at: None,
                    result: None,
                    error: None,
                },
            );
            state.order.push_back(job_id.clone());
            (position, state.order.len())
        };
        info!(job_id = %job_id, position, queue_length, "job admitted");

        if let Some(queue) = self.this.upgrade() {
            tokio::spawn(async move { queue.drain() });
        }

        SubmitReceipt {
            job_id,
            position,
            queue_length,
            rate_limit: self.limiter.snapshot(),
        }
    }

    /// Snapshot of one job, or `None` if it never existed or was evicted.
    pub fn status(&self, job_id: &JobId) -> Option<JobSnapshot> {
        let (job, position, queue_length) = {
            let state = self.lock();
            let job = state.jobs.get(job_id)?;
            let position = if job.status == JobStatus::Queued {
                state.position_of(job_id)
            } else {
                0
            };
            (job.clone(), position, state.order.len())
        };
        Some(JobSnapshot {
            job_id: job.id,
            status: job.status,
            position,
            queue_length,
            result: job.result,
            error: job.error,
            created_at: job.created_at,
            completed_at: job.completed_at,
            rate_limit: self.limiter.snapshot(),
        })
    }

    /// Cancel a job that has not started. Returns `false` for unknown,
    /// processing and finished jobs, leaving them untouched.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            let Some(job) = state.jobs.get_mut(job_id) else {
                return false;
            };
            if job.status != JobStatus::Queued {
                return false;
            }
            state.order.retain(|queued| queued != job_id);
            job.status = JobStatus::Failed;
            job.error = Some(CANCELLED_MESSAGE.to_string());
            job.completed_at = Some(now_timestamp());
        }
        info!(job_id = %job_id, "job cancelled");
        self.schedule_eviction(job_id.clone());
        true
    }

    pub fn stats(&self) -> QueueStats {
        let (queue_length, is_processing, total_jobs) = {
            let state = self.lock();
            (
                state.order.len(),
                state.processing.is_some(),
                state.jobs.len(),
            )
        };
        QueueStats {
            queue_length,
            is_processing,
            total_jobs,
            rate_limit: self.limiter.snapshot(),
        }
    }

    /// Try to start the head job.
    ///
    /// A no-op while a job is processing, when the queue is empty, or when
    /// the rate limiter refuses; in the last case the head job stays queued
    /// until the next trigger. Redundant calls are harmless.
    pub fn drain(&self) {
        let (job_id, params) = {
            let mut guard = self.lock();
            let state = &mut *guard;

            if let Some(current) = &state.processing {
                debug!(job_id = %current, "drain skipped: a job is processing");
                return;
            }

            loop {
                let Some(head) = state.order.front().cloned() else {
                    debug!("drain skipped: queue empty");
                    return;
                };

                if let Dispatch::Limited { window, reset_in } = self.limiter.can_dispatch() {
                    debug!(
                        job_id = %head,
                        window = %window,
                        reset_in_ms = duration_ms(reset_in),
                        "head job held by rate limit"
                    );
                    return;
                }

                state.order.pop_front();
                let Some(job) = state.jobs.get_mut(&head) else {
                    warn!(job_id = %head, "queued id has no job record; dropping");
                    continue;
                };
                job.status = JobStatus::Processing;
                let params = job.params.clone();
                state.processing = Some(head.clone());
                self.limiter.record_dispatch();
                break (head, params);
            }
        };

        info!(
            job_id = %job_id,
            converter = self.worker.converter_name(),
            "job dispatched"
        );

        match self.this.upgrade() {
            Some(queue) => {
                tokio::spawn(async move { queue.run_job(job_id, params).await });
            }
            None => debug!(job_id = %job_id, "queue dropped before dispatch"),
        }
    }

    async fn run_job(self: Arc<Self>, job_id: JobId, params: JobParams) {
        // The conversion gets its own task so a panicking converter fails the
        // job instead of leaving the worker slot occupied.
        let worker = self.worker.clone();
        let call_params = params.clone();
        let outcome = match tokio::spawn(async move { worker.run(&call_params).await }).await {
            Ok(outcome) => outcome,
            Err(e) => Err(AggieError::Internal(format!("conversion task failed: {e}"))),
        };

        if let Ok(output) = &outcome
            && let Err(e) = self
                .cache
                .store(
                    &params.fingerprint,
                    &output.calendar_text,
                    output.output_ref.as_deref(),
                )
                .await
        {
            warn!(
                job_id = %job_id,
                fingerprint = %params.fingerprint,
                error = %e,
                "failed to cache calendar"
            );
        }

        self.finish(&job_id, outcome);
        self.schedule_eviction(job_id);
        self.drain();
    }

    fn finish(&self, job_id: &JobId, outcome: Result<ConversionOutput, AggieError>) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.processing.as_ref() == Some(job_id) {
            state.processing = None;
        }
        let Some(job) = state.jobs.get_mut(job_id) else {
            return;
        };
        job.completed_at = Some(now_timestamp());
        match outcome {
            Ok(output) => {
                info!(job_id = %job_id, events = output.event_count, "job completed");
                job.status = JobStatus::Completed;
                job.result = Some(output);
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "job failed");
                job.status = JobStatus::Failed;
                job.error = Some(e.to_string());
            }
        }
    }

    fn schedule_eviction(&self, job_id: JobId) {
        let queue = self.this.clone();
        let retention = self.retention;
        tokio::spawn(async move {
            tokio::time::sleep(retention).await;
            if let Some(queue) = queue.upgrade() {
                queue.evict(&job_id);
            }
        });
    }

    fn evict(&self, job_id: &JobId) {
        let mut state = self.lock();
        let terminal = state
            .jobs
            .get(job_id)
            .is_some_and(|job| job.status.is_terminal());
        if terminal {
            state.jobs.remove(job_id);
            debug!(job_id = %job_id, "job evicted");
        }
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("JobQueue")
            .field("queue_length", &state.order.len())
            .field("processing", &state.processing)
            .field("total_jobs", &state.jobs.len())
            .finish()
    }
}
