// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./deskpulse.toml` > `~/.config/deskpulse/deskpulse.toml`
//! > `/etc/deskpulse/deskpulse.toml` with environment variable overrides via the
//! `DESKPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DeskpulseConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/deskpulse/deskpulse.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "deskpulse.toml";

/// Section names recognised by the environment mapping.
const ENV_SECTIONS: &[&str] = &["service", "freshdesk", "cache", "kpi"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/deskpulse/deskpulse.toml`
/// 3. `~/.config/deskpulse/deskpulse.toml`
/// 4. `./deskpulse.toml`
/// 5. `DESKPULSE_*` environment variables
pub fn load_config() -> Result<DeskpulseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and inline configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DeskpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskpulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DeskpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskpulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DeskpulseConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// `~/.config/deskpulse/deskpulse.toml`, when a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("deskpulse").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DESKPULSE_CACHE_TTL_SECS` must map to `cache.ttl_secs`, not
/// `cache.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("DESKPULSE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
