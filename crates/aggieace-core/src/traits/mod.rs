// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits the job queue is written against.
//!
//! Both use `#[async_trait]` so they can be held as `Arc<dyn …>`.

pub mod cache;
pub mod converter;

pub use cache::CacheStore;
pub use converter::Converter;
