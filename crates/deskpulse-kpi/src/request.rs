// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KPI request parameters; a normalized request is the cache key.

use chrono::{DateTime, Utc};
use deskpulse_core::Ticket;
use serde::{Deserialize, Serialize};

/// The metrics the engine can compute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    Summary,
    Backlog,
    Frt,
    Resolution,
    OldestOpen,
    Drilldown,
}

/// Row selection for the drill-down metric.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DrilldownView {
    /// Backlog tickets, most recently updated first.
    #[default]
    Backlog,
    /// Backlog tickets, oldest first.
    OldestOpen,
    /// All tickets, most recently updated first.
    Recent,
}

impl DrilldownView {
    pub fn backlog_only(self) -> bool {
        matches!(self, Self::Backlog | Self::OldestOpen)
    }
}

/// One KPI request. Filters apply to every metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KpiRequest {
    pub metric: Metric,
    /// Inclusive lower bound on `created_at`; also sent upstream as `updated_since`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    pub status: Option<i64>,
    pub tag: Option<String>,
    pub group_id: Option<u64>,
    /// Matched against the ticket's responder.
    pub agent_id: Option<u64>,
    /// Drill-down row limit.
    pub limit: Option<usize>,
    /// Drill-down view.
    pub view: Option<DrilldownView>,
}

impl KpiRequest {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            from: None,
            to: None,
            status: None,
            tag: None,
            group_id: None,
            agent_id: None,
            limit: None,
            view: None,
        }
    }

    pub fn with_range(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_status(mut self, status: i64) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_group(mut self, group_id: u64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_agent(mut self, agent_id: u64) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_view(mut self, view: DrilldownView) -> Self {
        self.view = Some(view);
        self
    }

    /// Canonical form used as the cache key.
    ///
    /// Parameters a metric ignores are cleared so they cannot split the
    /// cache. The drill-down limit is defaulted and clamped to
    /// `[1, max_limit]`, and the view defaulted.
    pub fn normalized(&self, default_limit: usize, max_limit: usize) -> Self {
        let mut request = self.clone();
        if request.metric == Metric::Drilldown {
            let max_limit = max_limit.max(1);
            request.limit = Some(request.limit.unwrap_or(default_limit).clamp(1, max_limit));
            request.view = Some(request.view.unwrap_or_default());
        } else {
            request.limit = None;
            request.view = None;
        }
        if let Some(tag) = &request.tag {
            if tag.trim().is_empty() {
                request.tag = None;
            }
        }
        request
    }

    /// True when `ticket` passes every filter set on this request.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !ticket.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if self.group_id.is_some() && self.group_id != ticket.group_id {
            return false;
        }
        if self.agent_id.is_some() && self.agent_id != ticket.responder_id {
            return false;
        }
        if self.from.is_some_and(|from| ticket.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| ticket.created_at > to) {
            return false;
        }
        true
    }
}
