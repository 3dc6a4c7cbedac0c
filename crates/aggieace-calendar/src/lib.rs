// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calendar generation for the AggieAce conversion pipeline.
//!
//! The external model only extracts a plain event list from the syllabus;
//! everything after that is deterministic and lives here:
//!
//! - [`events`] parses extracted lines into dated, possibly weekly events
//! - [`ics`] renders and validates iCalendar text
//! - [`converter`] provides the [`aggieace_core::Converter`] implementations

pub mod converter;
pub mod events;
pub mod ics;

pub use converter::{CommandExtractor, EventExtractor, ExtractionConverter, ScriptConverter};
pub use events::{EventTime, ExtractedEvent, Schedule, parse_extracted_events, parse_time};
pub use ics::{generate_ics, validate_ics};
