// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for deskpulse.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and miette
//! diagnostic rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use deskpulse_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("cache ttl: {}s", config.cache.ttl_secs);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CacheConfig, DeskpulseConfig, FreshdeskConfig, KpiConfig, ServiceConfig};

use std::path::Path;

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the TOML files are re-read so diagnostics can point at
/// the offending key.
pub fn load_and_validate() -> Result<DeskpulseConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<DeskpulseConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<DeskpulseConfig, Vec<ConfigError>> {
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

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![Path::new(loader::SYSTEM_CONFIG_PATH).to_path_buf()];
    candidates.extend(loader::user_config_path());
    if let Ok(dir) = std::env::current_dir() {
        candidates.push(dir.join(loader::LOCAL_CONFIG_FILE));
    }

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            tracing::debug!(path = %path.display(), "read config source for diagnostics");
            Some((path.display().to_string(), content))
        })
        .collect()
}
