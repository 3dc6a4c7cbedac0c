// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the cache, the job queue and the converters.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AggieError;

/// Format accepted for semester boundary dates, e.g. `08/25/2025`.
pub const SEMESTER_DATE_FORMAT: &str = "%m/%d/%Y";

/// Lowercase hex SHA-256 digest of a document's raw bytes.
///
/// Identical bytes always yield the same fingerprint; file names and
/// metadata never participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a conversion job, allocated at admission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Allocate a fresh random (UUID v4) job id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a job. Transitions only move forward:
/// `Queued -> Processing -> Completed | Failed`, or `Queued -> Failed` on cancel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend is operational but experiencing issues.
    Degraded(String),
    /// Backend is not operational.
    Unhealthy(String),
}

/// Class information submitted alongside a syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    /// Course name, e.g. "CSCE 311".
    pub class_name: String,
    /// Section number, e.g. "546".
    pub section_number: String,
    /// First day of the semester.
    pub semester_start: NaiveDate,
    /// Last day of the semester.
    pub semester_end: NaiveDate,
    /// IANA timezone name, e.g. "America/Chicago".
    pub timezone: String,
}

impl ClassMetadata {
    /// Build metadata from raw request fields, parsing `MM/DD/YYYY` dates.
    ///
    /// Rejects empty names, unparseable dates, and a semester that ends
    /// before it starts.
    pub fn parse(
        class_name: &str,
        section_number: &str,
        semester_start: &str,
        semester_end: &str,
        timezone: &str,
    ) -> Result<Self, AggieError> {
        if class_name.trim().is_empty() {
            return Err(AggieError::InvalidInput("class name must not be empty".into()));
        }
        if section_number.trim().is_empty() {
            return Err(AggieError::InvalidInput(
                "section number must not be empty".into(),
            ));
        }
        if timezone.trim().is_empty() {
            return Err(AggieError::InvalidInput("timezone must not be empty".into()));
        }

        let start = parse_semester_date(semester_start)?;
        let end = parse_semester_date(semester_end)?;
        if end < start {
            return Err(AggieError::InvalidInput(format!(
                "semester end {semester_end} is before semester start {semester_start}"
            )));
        }

        Ok(Self {
            class_name: class_name.trim().to_string(),
            section_number: section_number.trim().to_string(),
            semester_start: start,
            semester_end: end,
            timezone: timezone.trim().to_string(),
        })
    }

    /// Calendar display name, e.g. "CSCE 311 (546)".
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.class_name, self.section_number)
    }
}

/// Parse a semester date in `MM/DD/YYYY` form.
pub fn parse_semester_date(value: &str) -> Result<NaiveDate, AggieError> {
    NaiveDate::parse_from_str(value.trim(), SEMESTER_DATE_FORMAT).map_err(|_| {
        AggieError::InvalidInput(format!(
            "invalid date format: {value}. Expected MM/DD/YYYY"
        ))
    })
}

/// Everything a converter needs for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobParams {
    /// Location of the uploaded (unconverted) document.
    pub document_path: PathBuf,
    /// Fingerprint computed before admission; the cache key for the result.
    pub fingerprint: Fingerprint,
    /// Class information used to scope the extraction.
    pub metadata: ClassMetadata,
}

/// Successful result of a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Generated iCalendar text.
    pub calendar_text: String,
    /// Where the converter wrote the calendar, if it wrote one.
    pub output_ref: Option<String>,
    /// Number of VEVENT blocks in `calendar_text`.
    pub event_count: usize,
}

/// A persisted Result Cache row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub calendar_text: String,
    pub source_path: Option<String>,
    /// ISO 8601 timestamp of the last write.
    pub created_at: String,
}

/// Current UTC time in the ISO 8601 form used for persisted timestamps.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
