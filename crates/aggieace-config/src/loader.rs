// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./aggieace.toml` > `~/.config/aggieace/aggieace.toml` >
//! `/etc/aggieace/aggieace.toml`, then `AGGIEACE_*` variables, then the bare
//! `MAX_CALLS_PER_DAY` / `MAX_CALLS_PER_MINUTE` variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AggieConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/aggieace/aggieace.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "aggieace.toml";

/// Path of the per-user configuration file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aggieace").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/aggieace/aggieace.toml`
/// 3. `~/.config/aggieace/aggieace.toml`
/// 4. `./aggieace.toml`
/// 5. `AGGIEACE_*` environment variables
/// 6. `MAX_CALLS_PER_DAY` / `MAX_CALLS_PER_MINUTE`
pub fn load_config() -> Result<AggieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AggieConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(prefixed_env())
        .merge(rate_limit_env())
        .extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<AggieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AggieConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AggieConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AggieConfig::default()))
        .merge(Toml::file(path))
        .merge(prefixed_env())
        .merge(rate_limit_env())
        .extract()
}

/// `AGGIEACE_<SECTION>_<KEY>` variables.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `AGGIEACE_RATE_LIMIT_MAX_CALLS_PER_DAY` must become
/// `rate_limit.max_calls_per_day`.
fn prefixed_env() -> Env {
    Env::prefixed("AGGIEACE_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = ["app", "rate_limit", "queue", "storage", "converter"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(&format!("{section}_"))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str);
        mapped.into()
    })
}

/// The unprefixed limit variables deployments already set.
fn rate_limit_env() -> Env {
    Env::raw()
        .only(&["MAX_CALLS_PER_DAY", "MAX_CALLS_PER_MINUTE"])
        .map(|key| format!("rate_limit.{}", key.as_str().to_ascii_lowercase()).into())
}
