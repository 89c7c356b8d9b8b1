// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a
//! no-op.

use metrics::{describe_counter, describe_histogram};

use crate::cache::CacheStatus;

/// Register all deskpulse metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "deskpulse_cache_requests_total",
        "KPI cache lookups by outcome (hit, miss, joined)"
    );
    describe_counter!(
        "deskpulse_upstream_requests_total",
        "Requests sent to the helpdesk API"
    );
    describe_counter!(
        "deskpulse_conversation_failures_total",
        "Tickets skipped because their conversations could not be fetched"
    );
    describe_histogram!(
        "deskpulse_kpi_compute_seconds",
        "Wall time of an uncached KPI computation in seconds"
    );
}

/// Record a cache lookup.
pub fn record_cache_request(status: CacheStatus) {
    metrics::counter!("deskpulse_cache_requests_total", "outcome" => status.as_ref().to_string())
        .increment(1);
}

/// Record a skipped conversation fetch.
pub fn record_conversation_failure() {
    metrics::counter!("deskpulse_conversation_failures_total").increment(1);
}

/// Record the duration of a metric computation.
pub fn record_compute_duration(metric: &str, seconds: f64) {
    metrics::histogram!("deskpulse_kpi_compute_seconds", "metric" => metric.to_string())
        .record(seconds);
}
