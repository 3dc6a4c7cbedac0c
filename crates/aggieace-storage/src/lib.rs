// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the AggieAce result cache.
//!
//! Provides a WAL-mode SQLite database with embedded migrations, a
//! single-writer model via `tokio-rusqlite`, and the [`SqliteCache`]
//! implementation of [`aggieace_core::CacheStore`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteCache;
pub use database::Database;
