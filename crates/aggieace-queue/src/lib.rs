// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control in front of the external calendar converter.
//!
//! A request is fingerprinted, checked against the result cache, and only
//! on a miss admitted to a FIFO [`JobQueue`]. The queue dispatches at most
//! one job at a time, and only when the [`RateLimiter`] has budget left in
//! both its daily and per-minute windows.

pub mod hasher;
pub mod queue;
pub mod rate_limit;
pub mod service;
pub mod worker;

pub use hasher::{fingerprint_bytes, fingerprint_file, fingerprint_reader};
pub use queue::{JobQueue, JobSnapshot, QueueStats, SubmitReceipt};
pub use rate_limit::{Dispatch, RateLimitSnapshot, RateLimiter, WindowKind, WindowSnapshot};
pub use service::{ConversionService, Submission};
pub use worker::ConversionWorker;
