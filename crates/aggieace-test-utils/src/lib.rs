// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for AggieAce integration tests.
//!
//! Provides mock collaborators and a harness that assembles the queue stack
//! for fast, deterministic tests without an LLM or a database.
//!
//! # Components
//!
//! - [`MockConverter`] - scripted conversion outcomes, gating and in-flight tracking
//! - [`MemoryCache`] - in-memory result cache with failure injection
//! - [`TestHarness`] - limiter, queue, service and mocks wired together

pub mod harness;
pub mod mock_cache;
pub mod mock_converter;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_cache::MemoryCache;
pub use mock_converter::{MockConverter, MockOutcome, SAMPLE_CALENDAR};
