// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Computed KPI values returned to callers.
//!
//! Minute fields are `Option<u64>`: `None` means "no data", never zero.

use chrono::{DateTime, Utc};
use deskpulse_core::TicketId;
use serde::Serialize;

use crate::cache::CacheStatus;
use crate::request::{DrilldownView, Metric};

/// Result of one metric computation, tagged with the metric name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum KpiReport {
    Summary(SummaryReport),
    Backlog(BacklogReport),
    Frt(FrtReport),
    Resolution(ResolutionReport),
    OldestOpen(OldestOpenReport),
    Drilldown(DrilldownReport),
}

impl KpiReport {
    pub fn metric(&self) -> Metric {
        match self {
            KpiReport::Summary(_) => Metric::Summary,
            KpiReport::Backlog(_) => Metric::Backlog,
            KpiReport::Frt(_) => Metric::Frt,
            KpiReport::Resolution(_) => Metric::Resolution,
            KpiReport::OldestOpen(_) => Metric::OldestOpen,
            KpiReport::Drilldown(_) => Metric::Drilldown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_tickets: usize,
    /// Backlog tickets (status 2, 3 or 6).
    pub open_tickets: usize,
    /// Resolved or closed tickets (status 4 or 5).
    pub closed_tickets: usize,
    pub median_frt_minutes: Option<u64>,
    pub p90_frt_minutes: Option<u64>,
    pub frt_sample_size: usize,
    pub median_resolution_minutes: Option<u64>,
    pub p90_resolution_minutes: Option<u64>,
    pub resolution_sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacklogReport {
    pub current_backlog: usize,
    pub tickets: Vec<TicketBrief>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketBrief {
    pub id: TicketId,
    pub subject: Option<String>,
    pub status: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrtReport {
    pub median_frt_minutes: Option<u64>,
    pub p90_frt_minutes: Option<u64>,
    pub sample_size: usize,
    /// Tickets left out because their conversations could not be fetched.
    pub skipped_tickets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub median_resolution_minutes: Option<u64>,
    pub p90_resolution_minutes: Option<u64>,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OldestOpenReport {
    pub tickets: Vec<AgedTicket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgedTicket {
    pub id: TicketId,
    pub subject: Option<String>,
    pub status: i64,
    pub created_at: DateTime<Utc>,
    pub age_days: u64,
    pub age_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownReport {
    pub meta: DrilldownMeta,
    pub rows: Vec<DrilldownRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownMeta {
    pub view: DrilldownView,
    pub count: usize,
    pub limit: usize,
    pub filters: DrilldownFilters,
}

/// Filters echoed back with a drill-down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownFilters {
    pub status: Option<i64>,
    pub tag: Option<String>,
    pub group_id: Option<u64>,
    pub agent_id: Option<u64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrilldownRow {
    pub id: TicketId,
    pub subject: String,
    pub status: i64,
    pub priority: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub age_minutes: u64,
    pub tags: Vec<String>,
    pub group_id: Option<u64>,
    pub agent_id: Option<u64>,
}

/// A report together with how the cache served it.
#[derive(Debug, Clone, Serialize)]
pub struct KpiResponse {
    #[serde(flatten)]
    pub report: KpiReport,
    pub cache: CacheStatus,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_metric_tag() {
        let report = KpiReport::Frt(FrtReport {
            median_frt_minutes: Some(30),
            p90_frt_minutes: None,
            sample_size: 1,
            skipped_tickets: 0,
        });
        let json = serde_json::to_value(&report).expect("serializes");
        assert_eq!(json["metric"], "frt");
        assert_eq!(json["median_frt_minutes"], 30);
        assert!(json["p90_frt_minutes"].is_null());
        assert_eq!(report.metric(), Metric::Frt);
    }

    #[test]
    fn response_flattens_report() {
        let response = KpiResponse {
            report: KpiReport::OldestOpen(OldestOpenReport { tickets: vec![] }),
            cache: CacheStatus::Hit,
            computed_at: "2025-12-14T10:00:00Z".parse().expect("valid timestamp"),
        };
        let json = serde_json::to_value(&response).expect("serializes");
        assert_eq!(json["metric"], "oldest_open");
        assert_eq!(json["cache"], "hit");
        assert!(json["tickets"].as_array().is_some_and(|t| t.is_empty()));
    }
}
