// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the AggieAce conversion pipeline.
//!
//! TOML files in the XDG hierarchy are merged with environment overrides
//! through Figment, validated, and any problem is rendered as a miette
//! diagnostic with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use aggieace_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("minute budget: {}", config.rate_limit.max_calls_per_minute);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AggieConfig;

/// Load configuration and validate it.
///
/// With `explicit_path` the given file replaces the XDG lookup; environment
/// overrides still apply. Figment errors are converted into diagnostics that
/// point into the offending file.
pub fn load_and_validate(explicit_path: Option<&Path>) -> Result<AggieConfig, Vec<ConfigError>> {
    let loaded = match explicit_path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources(explicit_path);
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<AggieConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every config file that may have contributed, for error spans.
fn collect_toml_sources(explicit_path: Option<&Path>) -> Vec<(String, String)> {
    let candidates = match explicit_path {
        Some(path) => vec![path.to_path_buf()],
        None => {
            let local = std::env::current_dir()
                .map(|d| d.join(loader::LOCAL_CONFIG_FILE))
                .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.into());
            let mut paths = vec![local];
            paths.extend(loader::user_config_path());
            paths.push(loader::SYSTEM_CONFIG_PATH.into());
            paths
        }
    };

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
