// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! rejected at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level AggieAce configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AggieConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// External LLM call budgets.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Job queue retention and watchdog settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Result cache database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// External converter invocation settings.
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Call budgets against the external LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Calls allowed between two local midnights.
    #[serde(default = "default_max_calls_per_day")]
    pub max_calls_per_day: u32,

    /// Calls allowed per 60-second window.
    #[serde(default = "default_max_calls_per_minute")]
    pub max_calls_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls_per_day: default_max_calls_per_day(),
            max_calls_per_minute: default_max_calls_per_minute(),
        }
    }
}

fn default_max_calls_per_day() -> u32 {
    100
}

fn default_max_calls_per_minute() -> u32 {
    5
}

/// Job queue settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Seconds a finished job stays visible to status polling.
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,

    /// Seconds before an in-flight conversion is abandoned as failed.
    #[serde(default = "default_conversion_timeout_secs")]
    pub conversion_timeout_secs: u64,
}

impl QueueConfig {
    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            job_retention_secs: default_job_retention_secs(),
            conversion_timeout_secs: default_conversion_timeout_secs(),
        }
    }
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_conversion_timeout_secs() -> u64 {
    300
}

/// Result cache database settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("aggieace").join("aggieace.db"))
        .unwrap_or_else(|| "aggieace.db".into())
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// What the configured program is expected to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterMode {
    /// The program writes the `.ics` file named by `--output`.
    #[default]
    Script,
    /// The program prints `Name | Date | Time | Location` lines on stdout and
    /// the calendar is rendered in-process.
    Extract,
}

/// How the external converter is launched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Whether `program` writes the calendar or only extracts events.
    #[serde(default)]
    pub mode: ConverterMode,

    /// Executable to spawn for each conversion.
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the per-job arguments.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Directory that receives generated `.ics` files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Timezone used when a request does not name one.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            mode: ConverterMode::default(),
            program: default_program(),
            args: default_args(),
            output_dir: default_output_dir(),
            default_timezone: default_timezone(),
        }
    }
}

fn default_program() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["scripts/process_syllabus.py".to_string()]
}

fn default_output_dir() -> String {
    dirs::cache_dir()
        .map(|p| p.join("aggieace").join("calendars"))
        .unwrap_or_else(|| "calendars".into())
        .display()
        .to_string()
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}
