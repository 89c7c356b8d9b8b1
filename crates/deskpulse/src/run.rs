// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations: tracing setup, engine wiring, JSON output.

use std::sync::Arc;

use deskpulse_config::DeskpulseConfig;
use deskpulse_core::{DeskError, TicketSource};
use deskpulse_freshdesk::FreshdeskClient;
use deskpulse_kpi::{KpiEngine, KpiRequest, KpiSettings};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries JSON.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deskpulse={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Installs the Prometheus recorder. Only one recorder can be installed per process.
fn install_metrics() -> Result<PrometheusHandle, DeskError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| DeskError::Internal(format!("failed to install Prometheus recorder: {e}")))?;
    deskpulse_kpi::recording::register_metrics();
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Computes one KPI against Freshdesk and prints it.
pub async fn run_metric(
    config: &DeskpulseConfig,
    request: &KpiRequest,
    with_metrics: bool,
) -> Result<(), DeskError> {
    let handle = if with_metrics {
        Some(install_metrics()?)
    } else {
        None
    };

    let source: Arc<dyn TicketSource> = Arc::new(FreshdeskClient::new(&config.freshdesk)?);
    let engine = KpiEngine::new(source, KpiSettings::from_config(config));
    println!("{}", render_report(&engine, request).await?);

    if let Some(handle) = handle {
        eprintln!("{}", handle.render());
    }
    Ok(())
}

/// Computes `request` and renders the response as pretty JSON.
pub async fn render_report(engine: &KpiEngine, request: &KpiRequest) -> Result<String, DeskError> {
    let response = engine.compute(request).await?;
    serde_json::to_string_pretty(&response)
        .map_err(|e| DeskError::Internal(format!("failed to serialize report: {e}")))
}

pub fn print_definitions() {
    let document = deskpulse_kpi::definitions_document(chrono::Utc::now());
    match serde_json::to_string_pretty(&document) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("deskpulse: failed to serialize definitions: {e}"),
    }
}

/// Reports a loaded, validated configuration.
pub fn check_config(config: &DeskpulseConfig) {
    println!("deskpulse: configuration is valid");
    println!(
        "  freshdesk: {}",
        config.freshdesk.domain.as_deref().unwrap_or("<not set>")
    );
    println!("  cache ttl: {}s", config.cache.ttl_secs);
    println!(
        "  frt sample: {} tickets, {} concurrent conversation fetches",
        config.kpi.frt_sample_limit, config.kpi.conversation_concurrency
    );
    if config.freshdesk.domain.is_none() || config.freshdesk.api_key.is_none() {
        warn!("freshdesk.domain and freshdesk.api_key must be set before computing KPIs");
        println!("  warning: freshdesk credentials are incomplete");
    }
}
