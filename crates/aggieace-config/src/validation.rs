// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::AggieConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &AggieConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.app.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    // A zero budget would hold every job forever.
    if config.rate_limit.max_calls_per_day == 0 {
        fail("rate_limit.max_calls_per_day must be at least 1".to_string());
    }
    if config.rate_limit.max_calls_per_minute == 0 {
        fail("rate_limit.max_calls_per_minute must be at least 1".to_string());
    }
    if config.rate_limit.max_calls_per_minute > config.rate_limit.max_calls_per_day {
        tracing::warn!(
            per_minute = config.rate_limit.max_calls_per_minute,
            per_day = config.rate_limit.max_calls_per_day,
            "per-minute limit exceeds the daily limit; the daily limit will dominate"
        );
    }

    if config.queue.job_retention_secs == 0 {
        fail("queue.job_retention_secs must be at least 1".to_string());
    }
    if config.queue.conversion_timeout_secs == 0 {
        fail("queue.conversion_timeout_secs must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.converter.program.trim().is_empty() {
        fail("converter.program must not be empty".to_string());
    }
    if config.converter.output_dir.trim().is_empty() {
        fail("converter.output_dir must not be empty".to_string());
    }
    if config.converter.default_timezone.trim().is_empty() {
        fail("converter.default_timezone must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
