// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static KPI catalogue for tooltips and contract checks. No upstream calls.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::request::Metric;

/// Bumped whenever a field name, unit or status set below changes.
pub const KPI_CONTRACT_VERSION: &str = "2025-12-14.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiDefinition {
    pub key: Metric,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub definition: &'static str,
    pub logic: &'static [&'static str],
    pub fields: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct DefinitionsDocument {
    pub kpi_contract_version: &'static str,
    pub updated_at: DateTime<Utc>,
    pub definitions: Vec<KpiDefinition>,
}

static DEFINITIONS: &[KpiDefinition] = &[
    KpiDefinition {
        key: Metric::Summary,
        title: "Summary",
        unit: None,
        definition: "Ticket totals with first-response and resolution statistics.",
        logic: &[
            "open_tickets counts status 2 (Open), 3 (Pending) and 6 (Waiting)",
            "closed_tickets counts status 4 (Resolved) and 5 (Closed)",
            "minute statistics follow the frt and resolution definitions",
        ],
        fields: &[
            "total_tickets",
            "open_tickets",
            "closed_tickets",
            "median_frt_minutes",
            "p90_frt_minutes",
            "frt_sample_size",
            "median_resolution_minutes",
            "p90_resolution_minutes",
            "resolution_sample_size",
        ],
    },
    KpiDefinition {
        key: Metric::Backlog,
        title: "Backlog",
        unit: Some("tickets"),
        definition: "Tickets waiting on the support team.",
        logic: &[
            "status in {2 Open, 3 Pending, 6 Waiting}",
            "Resolved (4) and Closed (5) are never backlog",
        ],
        fields: &["current_backlog", "tickets"],
    },
    KpiDefinition {
        key: Metric::Frt,
        title: "First response time",
        unit: Some("minutes"),
        definition: "Minutes from ticket creation to the first public agent reply.",
        logic: &[
            "a public agent reply is incoming = false and private not true",
            "negative values are discarded",
            "median and p90 use linear interpolation between closest ranks",
            "tickets whose conversations cannot be fetched are skipped and counted",
        ],
        fields: &[
            "median_frt_minutes",
            "p90_frt_minutes",
            "sample_size",
            "skipped_tickets",
        ],
    },
    KpiDefinition {
        key: Metric::Resolution,
        title: "Resolution time",
        unit: Some("minutes"),
        definition: "Minutes from ticket creation to last update for resolved and closed tickets.",
        logic: &[
            "status in {4 Resolved, 5 Closed}",
            "negative values are discarded",
            "median and p90 use linear interpolation between closest ranks",
        ],
        fields: &[
            "median_resolution_minutes",
            "p90_resolution_minutes",
            "sample_size",
        ],
    },
    KpiDefinition {
        key: Metric::OldestOpen,
        title: "Oldest open tickets",
        unit: Some("days"),
        definition: "Backlog tickets ordered by age, oldest first.",
        logic: &[
            "status in {2 Open, 3 Pending, 6 Waiting}",
            "age_days is whole days since creation",
        ],
        fields: &["tickets", "age_days", "age_minutes"],
    },
    KpiDefinition {
        key: Metric::Drilldown,
        title: "Drill-down",
        unit: None,
        definition: "Ticket rows behind a KPI, filtered and limited.",
        logic: &[
            "views backlog and oldest_open keep status {2, 3, 6} only",
            "oldest_open sorts by age, other views by last update",
            "limit is clamped to the configured maximum",
        ],
        fields: &["meta", "rows", "age_minutes"],
    },
];

/// All KPI definitions, in display order.
pub fn definitions() -> &'static [KpiDefinition] {
    DEFINITIONS
}

pub fn definition(metric: Metric) -> Option<&'static KpiDefinition> {
    DEFINITIONS.iter().find(|d| d.key == metric)
}

/// The catalogue as served to dashboards.
pub fn definitions_document(now: DateTime<Utc>) -> DefinitionsDocument {
    DefinitionsDocument {
        kpi_contract_version: KPI_CONTRACT_VERSION,
        updated_at: now,
        definitions: DEFINITIONS.to_vec(),
    }
}
