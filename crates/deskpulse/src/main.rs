// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! deskpulse - helpdesk KPIs from the command line.
//!
//! This is the binary entry point: it loads configuration, builds the
//! Freshdesk ticket source and the KPI engine, and prints one report as JSON.

mod run;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use deskpulse_kpi::{DrilldownView, KpiRequest, Metric};

/// deskpulse - helpdesk KPIs from the command line.
#[derive(Parser, Debug)]
#[command(name = "deskpulse", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the run.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ticket totals with first-response and resolution statistics.
    Summary(QueryArgs),
    /// Tickets in Open, Pending or Waiting.
    Backlog(QueryArgs),
    /// Median and p90 first-response time in minutes.
    Frt(QueryArgs),
    /// Median and p90 resolution time in minutes.
    Resolution(QueryArgs),
    /// Backlog tickets ordered by age.
    OldestOpen(QueryArgs),
    /// Ticket rows behind a KPI.
    Drilldown(DrilldownArgs),
    /// Print the KPI definitions catalogue.
    Definitions,
    /// Validate configuration and exit.
    CheckConfig,
}

/// Filters shared by every metric.
#[derive(Args, Debug, Clone, Default)]
struct QueryArgs {
    /// Earliest creation time (RFC 3339).
    #[arg(long)]
    from: Option<DateTime<Utc>>,
    /// Latest creation time (RFC 3339).
    #[arg(long)]
    to: Option<DateTime<Utc>>,
    /// Raw status code.
    #[arg(long)]
    status: Option<i64>,
    #[arg(long)]
    tag: Option<String>,
    #[arg(long)]
    group_id: Option<u64>,
    /// Responder (agent) id.
    #[arg(long)]
    agent_id: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct DrilldownArgs {
    #[command(flatten)]
    query: QueryArgs,
    /// Maximum rows; clamped to the configured ceiling.
    #[arg(long)]
    limit: Option<usize>,
    /// backlog, oldest_open or recent.
    #[arg(long, default_value = "backlog")]
    view: DrilldownView,
}

impl QueryArgs {
    fn into_request(self, metric: Metric) -> KpiRequest {
        KpiRequest {
            from: self.from,
            to: self.to,
            status: self.status,
            tag: self.tag,
            group_id: self.group_id,
            agent_id: self.agent_id,
            ..KpiRequest::new(metric)
        }
    }
}

impl Commands {
    /// The KPI request for metric subcommands, `None` for the others.
    fn request(&self) -> Option<KpiRequest> {
        let (metric, query) = match self {
            Commands::Summary(q) => (Metric::Summary, q),
            Commands::Backlog(q) => (Metric::Backlog, q),
            Commands::Frt(q) => (Metric::Frt, q),
            Commands::Resolution(q) => (Metric::Resolution, q),
            Commands::OldestOpen(q) => (Metric::OldestOpen, q),
            Commands::Drilldown(d) => {
                let mut request = d.query.clone().into_request(Metric::Drilldown);
                request.limit = d.limit;
                request.view = Some(d.view);
                return Some(request);
            }
            Commands::Definitions | Commands::CheckConfig => return None,
        };
        Some(query.clone().into_request(metric))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Commands::Definitions = cli.command {
        run::print_definitions();
        return;
    }

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => deskpulse_config::load_and_validate_path(path),
        None => deskpulse_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            deskpulse_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    run::init_tracing(&config.service.log_level);

    let Some(request) = cli.command.request() else {
        run::check_config(&config);
        return;
    };

    if let Err(e) = run::run_metric(&config, &request, cli.metrics).await {
        tracing::error!(error = %e, metric = %request.metric, "KPI computation failed");
        eprintln!("deskpulse: {e}");
        std::process::exit(1);
    }
}
