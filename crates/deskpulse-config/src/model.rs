// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for deskpulse.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level deskpulse configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskpulseConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Freshdesk API connection settings.
    #[serde(default)]
    pub freshdesk: FreshdeskConfig,

    /// KPI result cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// KPI computation limits.
    #[serde(default)]
    pub kpi: KpiConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "deskpulse".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Freshdesk API configuration.
///
/// Passed explicitly into the client constructor; nothing reads credentials
/// from ambient state.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FreshdeskConfig {
    /// Helpdesk domain, e.g. `acme.freshdesk.com`. `None` disables fetching.
    #[serde(default)]
    pub domain: Option<String>,

    /// API key, sent as the basic-auth user name.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Tickets requested per page (Freshdesk caps this at 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound on pages fetched per ticket listing.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient failures (429, 500, 502, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for FreshdeskConfig {
    fn default() -> Self {
        Self {
            domain: None,
            api_key: None,
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_per_page() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    1
}

/// KPI result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Time-to-live of a computed result, applied to every key.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    120
}

/// KPI computation limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KpiConfig {
    /// Tickets examined for first-response time (one conversation fetch each).
    #[serde(default = "default_frt_sample_limit")]
    pub frt_sample_limit: usize,

    /// Conversation fetches allowed in flight at once.
    #[serde(default = "default_conversation_concurrency")]
    pub conversation_concurrency: usize,

    /// Rows returned by the oldest-open metric.
    #[serde(default = "default_oldest_open_limit")]
    pub oldest_open_limit: usize,

    /// Drill-down rows when the request carries no limit.
    #[serde(default = "default_drilldown_default_limit")]
    pub drilldown_default_limit: usize,

    /// Hard ceiling for drill-down rows.
    #[serde(default = "default_drilldown_max_limit")]
    pub drilldown_max_limit: usize,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            frt_sample_limit: default_frt_sample_limit(),
            conversation_concurrency: default_conversation_concurrency(),
            oldest_open_limit: default_oldest_open_limit(),
            drilldown_default_limit: default_drilldown_default_limit(),
            drilldown_max_limit: default_drilldown_max_limit(),
        }
    }
}

fn default_frt_sample_limit() -> usize {
    100
}

fn default_conversation_concurrency() -> usize {
    4
}

fn default_oldest_open_limit() -> usize {
    20
}

fn default_drilldown_default_limit() -> usize {
    100
}

fn default_drilldown_max_limit() -> usize {
    500
}
