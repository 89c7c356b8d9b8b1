// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: positive
//! limits, the Freshdesk page size ceiling, a recognised log level.

use crate::diagnostic::ConfigError;
use crate::model::DeskpulseConfig;

/// Freshdesk rejects `per_page` above this value.
pub const MAX_PER_PAGE: u32 = 100;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &DeskpulseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.service.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` is not one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    let freshdesk = &config.freshdesk;
    if let Some(domain) = &freshdesk.domain {
        let domain = domain.trim();
        if domain.is_empty() {
            errors.push(ConfigError::validation(
                "freshdesk.domain must not be empty when set",
            ));
        } else if domain.contains("://") || domain.contains('/') {
            errors.push(ConfigError::validation(format!(
                "freshdesk.domain `{domain}` must be a bare host name, e.g. acme.freshdesk.com"
            )));
        }
    }
    if freshdesk.per_page == 0 || freshdesk.per_page > MAX_PER_PAGE {
        errors.push(ConfigError::validation(format!(
            "freshdesk.per_page must be between 1 and {MAX_PER_PAGE}, got {}",
            freshdesk.per_page
        )));
    }
    if freshdesk.max_pages == 0 {
        errors.push(ConfigError::validation(
            "freshdesk.max_pages must be at least 1",
        ));
    }
    if freshdesk.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "freshdesk.timeout_secs must be at least 1",
        ));
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ConfigError::validation("cache.ttl_secs must be at least 1"));
    }

    let kpi = &config.kpi;
    for (name, value) in [
        ("kpi.frt_sample_limit", kpi.frt_sample_limit),
        ("kpi.conversation_concurrency", kpi.conversation_concurrency),
        ("kpi.oldest_open_limit", kpi.oldest_open_limit),
        ("kpi.drilldown_default_limit", kpi.drilldown_default_limit),
        ("kpi.drilldown_max_limit", kpi.drilldown_max_limit),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{name} must be at least 1"
            )));
        }
    }
    if kpi.drilldown_default_limit > kpi.drilldown_max_limit {
        errors.push(ConfigError::validation(format!(
            "kpi.drilldown_default_limit ({}) must not exceed kpi.drilldown_max_limit ({})",
            kpi.drilldown_default_limit, kpi.drilldown_max_limit
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = DeskpulseConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let mut config = DeskpulseConfig::default();
        config.cache.ttl_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "cache.ttl_secs"));
    }

    #[test]
    fn per_page_above_ceiling_fails_validation() {
        let mut config = DeskpulseConfig::default();
        config.freshdesk.per_page = 250;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "freshdesk.per_page"));
    }

    #[test]
    fn domain_with_scheme_fails_validation() {
        let mut config = DeskpulseConfig::default();
        config.freshdesk.domain = Some("https://acme.freshdesk.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "bare host name"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = DeskpulseConfig::default();
        config.service.log_level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "service.log_level"));
    }

    #[test]
    fn drilldown_default_above_max_fails_validation() {
        let mut config = DeskpulseConfig::default();
        config.kpi.drilldown_default_limit = 600;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "must not exceed"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = DeskpulseConfig::default();
        config.cache.ttl_secs = 0;
        config.kpi.frt_sample_limit = 0;
        config.kpi.conversation_concurrency = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = DeskpulseConfig::default();
        config.freshdesk.domain = Some("acme.freshdesk.com".to_string());
        config.freshdesk.api_key = Some("key".to_string());
        config.cache.ttl_secs = 30;
        config.service.log_level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
