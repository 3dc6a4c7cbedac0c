// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock converter for deterministic queue tests.
//!
//! Outcomes are popped from a FIFO script; when it runs dry every call
//! succeeds with [`SAMPLE_CALENDAR`]. A gated converter holds each call
//! until the test releases it, which keeps a job observable in the
//! `Processing` state.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use aggieace_core::{AggieError, ConversionOutput, Converter, JobParams};

/// Minimal valid calendar returned by default.
pub const SAMPLE_CALENDAR: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
CALSCALE:GREGORIAN\r\n\
PRODID:-//AggieAce//Syllabus Converter//EN\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:CSCE 311 (546) - Midterm\r\n\
DTSTART;VALUE=DATE:20251015\r\n\
DTEND;VALUE=DATE:20251016\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// One scripted result.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with the given calendar text.
    Success(String),
    /// Fail with a conversion error carrying this message.
    Failure(String),
}

/// A converter that replays scripted outcomes and records its calls.
pub struct MockConverter {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    calls: Arc<Mutex<Vec<JobParams>>>,
    gate: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockConverter {
    /// A converter that always succeeds immediately.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A converter pre-loaded with the given outcomes.
    pub fn with_outcomes(outcomes: Vec<MockOutcome>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::from(outcomes))),
            ..Self::new()
        }
    }

    /// Make every call wait for a [`MockConverter::release`] permit.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` waiting (or future) calls proceed. No-op when not gated.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Append an outcome to the script.
    pub async fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Number of calls that reached the converter.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Parameters of every call so far, in order.
    pub async fn calls(&self) -> Vec<JobParams> {
        self.calls.lock().await.clone()
    }

    /// Calls currently inside `convert`.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous calls ever observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn next_outcome(&self) -> MockOutcome {
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Success(SAMPLE_CALENDAR.to_string()))
    }
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even when the call is dropped by a
/// timeout.
struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock-converter"
    }

    async fn convert(&self, params: &JobParams) -> Result<ConversionOutput, AggieError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(self.in_flight.clone());
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.calls.lock().await.push(params.clone());

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| AggieError::Internal(format!("mock gate closed: {e}")))?;
            permit.forget();
        }

        match self.next_outcome().await {
            MockOutcome::Success(calendar_text) => Ok(ConversionOutput {
                event_count: calendar_text.matches("BEGIN:VEVENT").count(),
                calendar_text,
                output_ref: None,
            }),
            MockOutcome::Failure(message) => Err(AggieError::conversion(message)),
        }
    }
}
