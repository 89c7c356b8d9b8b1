// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KPI engine: fetch, filter, reduce, guard, cache.
//!
//! A ticket fetch failure fails the whole computation. A conversation fetch
//! failure only removes that ticket from the first-response sample and is
//! reported as `skipped_tickets`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use deskpulse_config::DeskpulseConfig;
use deskpulse_core::{DeskError, Ticket, TicketId, TicketQuery, TicketSource};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::cache::KpiCache;
use crate::classifier::{
    StatusPartition, first_public_agent_reply, has_consistent_timestamps, is_backlog_status,
    is_resolved_status,
};
use crate::contract::{assert_backlog_count_matches_statuses, finalize_minutes};
use crate::recording;
use crate::report::{
    AgedTicket, BacklogReport, DrilldownFilters, DrilldownMeta, DrilldownReport, DrilldownRow,
    FrtReport, KpiReport, KpiResponse, OldestOpenReport, ResolutionReport, SummaryReport,
    TicketBrief,
};
use crate::request::{DrilldownView, KpiRequest, Metric};
use crate::stats::{elapsed_whole_minutes, median, minutes_between, p90, whole_minutes};

const MINUTES_PER_DAY: u64 = 24 * 60;

/// Turns a reduced statistic into the value reported in whole minutes.
type MinuteConversion = fn(f64) -> f64;

/// Source of "now" for age-based metrics.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Engine limits, usually taken from the `[cache]` and `[kpi]` sections.
#[derive(Debug, Clone)]
pub struct KpiSettings {
    pub cache_ttl: Duration,
    pub frt_sample_limit: usize,
    pub conversation_concurrency: usize,
    pub oldest_open_limit: usize,
    pub drilldown_default_limit: usize,
    pub drilldown_max_limit: usize,
}

impl KpiSettings {
    pub fn from_config(config: &DeskpulseConfig) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache.ttl_secs),
            frt_sample_limit: config.kpi.frt_sample_limit,
            conversation_concurrency: config.kpi.conversation_concurrency.max(1),
            oldest_open_limit: config.kpi.oldest_open_limit,
            drilldown_default_limit: config.kpi.drilldown_default_limit,
            drilldown_max_limit: config.kpi.drilldown_max_limit,
        }
    }
}

impl Default for KpiSettings {
    fn default() -> Self {
        Self::from_config(&DeskpulseConfig::default())
    }
}

/// A report and the instant it was computed, as stored in the cache.
#[derive(Debug, Clone)]
pub struct ComputedReport {
    pub report: KpiReport,
    pub computed_at: DateTime<Utc>,
}

struct EngineInner {
    source: Arc<dyn TicketSource>,
    settings: KpiSettings,
    clock: Arc<dyn Clock>,
    to_minutes: MinuteConversion,
    cache: KpiCache<KpiRequest, ComputedReport, DeskError>,
}

/// Computes KPIs from a ticket source, caching results per request.
#[derive(Clone)]
pub struct KpiEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for KpiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KpiEngine")
            .field("source", &self.inner.source.name())
            .field("settings", &self.inner.settings)
            .field("cache", &self.inner.cache)
            .finish()
    }
}

struct FrtSample {
    minutes: Vec<f64>,
    skipped: usize,
}

impl KpiEngine {
    pub fn new(source: Arc<dyn TicketSource>, settings: KpiSettings) -> Self {
        Self::with_clock(source, settings, SystemClock)
    }

    pub fn with_clock(
        source: Arc<dyn TicketSource>,
        settings: KpiSettings,
        clock: impl Clock,
    ) -> Self {
        Self::assemble(source, settings, clock, whole_minutes)
    }

    fn assemble(
        source: Arc<dyn TicketSource>,
        settings: KpiSettings,
        clock: impl Clock,
        to_minutes: MinuteConversion,
    ) -> Self {
        let cache = KpiCache::new(settings.cache_ttl);
        Self {
            inner: Arc::new(EngineInner {
                source,
                settings,
                clock: Arc::new(clock),
                to_minutes,
                cache,
            }),
        }
    }

    pub fn settings(&self) -> &KpiSettings {
        &self.inner.settings
    }

    pub fn cache(&self) -> &KpiCache<KpiRequest, ComputedReport, DeskError> {
        &self.inner.cache
    }

    /// Computes `request`, serving it from the cache when fresh.
    pub async fn compute(&self, request: &KpiRequest) -> Result<KpiResponse, DeskError> {
        let key = self.normalize(request);
        let engine = self.clone();
        let job_key = key.clone();
        let (computed, status) = self
            .inner
            .cache
            .get_or_compute(key, move || async move { engine.compute_report(&job_key).await })
            .await?;

        recording::record_cache_request(status);
        debug!(metric = %request.metric, cache = %status, "KPI served");

        Ok(KpiResponse {
            report: computed.report.clone(),
            cache: status,
            computed_at: computed.computed_at,
        })
    }

    /// Computes `request` without reading or writing the cache.
    pub async fn compute_uncached(&self, request: &KpiRequest) -> Result<KpiReport, DeskError> {
        let key = self.normalize(request);
        Ok(self.compute_report(&key).await?.report)
    }

    fn normalize(&self, request: &KpiRequest) -> KpiRequest {
        let settings = &self.inner.settings;
        request.normalized(settings.drilldown_default_limit, settings.drilldown_max_limit)
    }

    async fn compute_report(&self, request: &KpiRequest) -> Result<ComputedReport, DeskError> {
        let started = std::time::Instant::now();
        let metric = request.metric;

        let query = TicketQuery {
            updated_since: request.from,
        };
        let fetched = self.inner.source.fetch_tickets(&query).await?;
        let fetched_count = fetched.len();
        let tickets: Vec<Ticket> = fetched.into_iter().filter(|t| request.matches(t)).collect();

        let report = match metric {
            Metric::Summary => KpiReport::Summary(self.summary(&tickets).await?),
            Metric::Backlog => KpiReport::Backlog(backlog(&tickets)?),
            Metric::Frt => KpiReport::Frt(self.frt(&tickets).await?),
            Metric::Resolution => KpiReport::Resolution(self.resolution(&tickets)?),
            Metric::OldestOpen => KpiReport::OldestOpen(self.oldest_open(&tickets)?),
            Metric::Drilldown => KpiReport::Drilldown(self.drilldown(request, &tickets)?),
        };

        let elapsed = started.elapsed();
        recording::record_compute_duration(metric.as_ref(), elapsed.as_secs_f64());
        info!(
            metric = %metric,
            source = self.inner.source.name(),
            fetched = fetched_count,
            matched = tickets.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "KPI computed"
        );

        Ok(ComputedReport {
            report,
            computed_at: self.inner.clock.now(),
        })
    }

    async fn summary(&self, tickets: &[Ticket]) -> Result<SummaryReport, DeskError> {
        let partition = StatusPartition::of(tickets);
        assert_backlog_count_matches_statuses(
            partition.backlog.len(),
            &partition.backlog_statuses(),
        )?;

        let frt = self.frt_sample(tickets).await;
        let (median_frt_minutes, p90_frt_minutes) =
            self.reduce(&frt.minutes, "median_frt_minutes", "p90_frt_minutes")?;

        let resolution = resolution_sample(tickets);
        let (median_resolution_minutes, p90_resolution_minutes) = self.reduce(
            &resolution,
            "median_resolution_minutes",
            "p90_resolution_minutes",
        )?;

        Ok(SummaryReport {
            total_tickets: tickets.len(),
            open_tickets: partition.backlog.len(),
            closed_tickets: partition.resolved.len(),
            median_frt_minutes,
            p90_frt_minutes,
            frt_sample_size: frt.minutes.len(),
            median_resolution_minutes,
            p90_resolution_minutes,
            resolution_sample_size: resolution.len(),
        })
    }

    async fn frt(&self, tickets: &[Ticket]) -> Result<FrtReport, DeskError> {
        let sample = self.frt_sample(tickets).await;
        let (median_frt_minutes, p90_frt_minutes) =
            self.reduce(&sample.minutes, "median_frt_minutes", "p90_frt_minutes")?;
        Ok(FrtReport {
            median_frt_minutes,
            p90_frt_minutes,
            sample_size: sample.minutes.len(),
            skipped_tickets: sample.skipped,
        })
    }

    /// First-response minutes for the first `frt_sample_limit` tickets.
    async fn frt_sample(&self, tickets: &[Ticket]) -> FrtSample {
        let settings = &self.inner.settings;
        let source = Arc::clone(&self.inner.source);
        let jobs: Vec<(TicketId, DateTime<Utc>)> = tickets
            .iter()
            .take(settings.frt_sample_limit)
            .map(|t| (t.id, t.created_at))
            .collect();

        let threads: Vec<_> = stream::iter(jobs)
            .map(move |(id, created_at)| {
                let source = Arc::clone(&source);
                async move { (id, created_at, source.fetch_conversations(id).await) }
            })
            .buffer_unordered(settings.conversation_concurrency.max(1))
            .collect()
            .await;

        let mut sample = FrtSample {
            minutes: Vec::with_capacity(threads.len()),
            skipped: 0,
        };
        for (id, created_at, thread) in threads {
            match thread {
                Ok(entries) => {
                    let minutes = first_public_agent_reply(&entries)
                        .map(|reply| minutes_between(created_at, reply.created_at))
                        .filter(|m| *m >= 0.0);
                    if let Some(minutes) = minutes {
                        sample.minutes.push(minutes);
                    }
                }
                Err(e) => {
                    warn!(ticket_id = %id, error = %e, "conversations unavailable, ticket skipped");
                    recording::record_conversation_failure();
                    sample.skipped += 1;
                }
            }
        }
        sample
    }

    fn resolution(&self, tickets: &[Ticket]) -> Result<ResolutionReport, DeskError> {
        let sample = resolution_sample(tickets);
        let (median_resolution_minutes, p90_resolution_minutes) = self.reduce(
            &sample,
            "median_resolution_minutes",
            "p90_resolution_minutes",
        )?;
        Ok(ResolutionReport {
            median_resolution_minutes,
            p90_resolution_minutes,
            sample_size: sample.len(),
        })
    }

    /// Median and p90 of a real-valued sample. Each statistic is converted
    /// to whole minutes once, then passed through the contract guard.
    fn reduce(
        &self,
        sample: &[f64],
        median_field: &str,
        p90_field: &str,
    ) -> Result<(Option<u64>, Option<u64>), DeskError> {
        let to_minutes = self.inner.to_minutes;
        let mid = finalize_minutes(median_field, median(sample).map(to_minutes))?;
        let high = finalize_minutes(p90_field, p90(sample).map(to_minutes))?;
        Ok((mid, high))
    }

    fn oldest_open(&self, tickets: &[Ticket]) -> Result<OldestOpenReport, DeskError> {
        let now = self.inner.clock.now();
        let mut aged: Vec<AgedTicket> = tickets
            .iter()
            .filter(|t| is_backlog_status(t.status))
            .map(|t| {
                let age_minutes = age_minutes(t.created_at, now);
                AgedTicket {
                    id: t.id,
                    subject: t.subject.clone(),
                    status: t.status,
                    created_at: t.created_at,
                    age_days: age_minutes / MINUTES_PER_DAY,
                    age_minutes,
                }
            })
            .collect();
        aged.sort_by(|a, b| b.age_minutes.cmp(&a.age_minutes).then(a.id.cmp(&b.id)));
        aged.truncate(self.inner.settings.oldest_open_limit);

        let statuses: Vec<i64> = aged.iter().map(|t| t.status).collect();
        assert_backlog_count_matches_statuses(aged.len(), &statuses)?;
        Ok(OldestOpenReport { tickets: aged })
    }

    fn drilldown(
        &self,
        request: &KpiRequest,
        tickets: &[Ticket],
    ) -> Result<DrilldownReport, DeskError> {
        let now = self.inner.clock.now();
        let view = request.view.unwrap_or_default();
        let limit = request
            .limit
            .unwrap_or(self.inner.settings.drilldown_default_limit);

        let mut rows: Vec<DrilldownRow> = tickets
            .iter()
            .filter(|t| !view.backlog_only() || is_backlog_status(t.status))
            .map(|t| DrilldownRow {
                id: t.id,
                subject: t.subject.clone().unwrap_or_default(),
                status: t.status,
                priority: t.priority,
                created_at: t.created_at,
                updated_at: t.updated_at,
                age_minutes: age_minutes(t.created_at, now),
                tags: t.tags.clone(),
                group_id: t.group_id,
                agent_id: t.responder_id,
            })
            .collect();

        match view {
            DrilldownView::OldestOpen => {
                rows.sort_by(|a, b| b.age_minutes.cmp(&a.age_minutes).then(a.id.cmp(&b.id)))
            }
            DrilldownView::Backlog | DrilldownView::Recent => {
                rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)))
            }
        }
        rows.truncate(limit);

        if view.backlog_only() {
            let statuses: Vec<i64> = rows.iter().map(|r| r.status).collect();
            assert_backlog_count_matches_statuses(rows.len(), &statuses)?;
        }

        Ok(DrilldownReport {
            meta: DrilldownMeta {
                view,
                count: rows.len(),
                limit,
                filters: DrilldownFilters {
                    status: request.status,
                    tag: request.tag.clone(),
                    group_id: request.group_id,
                    agent_id: request.agent_id,
                    from: request.from,
                    to: request.to,
                },
            },
            rows,
        })
    }
}

fn backlog(tickets: &[Ticket]) -> Result<BacklogReport, DeskError> {
    let backlog: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| is_backlog_status(t.status))
        .collect();
    let statuses: Vec<i64> = backlog.iter().map(|t| t.status).collect();
    assert_backlog_count_matches_statuses(backlog.len(), &statuses)?;

    Ok(BacklogReport {
        current_backlog: backlog.len(),
        tickets: backlog
            .into_iter()
            .map(|t| TicketBrief {
                id: t.id,
                subject: t.subject.clone(),
                status: t.status,
                created_at: t.created_at,
            })
            .collect(),
    })
}

/// Creation-to-last-update minutes of resolved and closed tickets.
fn resolution_sample(tickets: &[Ticket]) -> Vec<f64> {
    tickets
        .iter()
        .filter(|t| is_resolved_status(t.status))
        .filter(|t| has_consistent_timestamps(t))
        .map(|t| minutes_between(t.created_at, t.updated_at))
        .filter(|m| *m >= 0.0)
        .collect()
}

/// Ticket age in whole minutes; tickets created "in the future" are age 0.
fn age_minutes(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    elapsed_whole_minutes(created_at, now).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use deskpulse_core::ContractViolation;
    use deskpulse_test_utils::{MockTicketSource, TicketBuilder, agent_reply};

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().expect("valid timestamp")
    }

    fn ticket(id: u64, status: i64, created: &str, updated: &str) -> Ticket {
        Ticket {
            id: TicketId(id),
            subject: Some(format!("ticket {id}")),
            status,
            priority: None,
            created_at: at(created),
            updated_at: at(updated),
            tags: vec![],
            group_id: None,
            responder_id: None,
            requester_id: None,
        }
    }

    fn engine_converting_with(
        source: &MockTicketSource,
        to_minutes: MinuteConversion,
    ) -> KpiEngine {
        let now = at("2025-12-20T10:00:00Z");
        KpiEngine::assemble(
            Arc::new(source.clone()),
            KpiSettings::default(),
            move || now,
            to_minutes,
        )
    }

    /// One open ticket answered after 30 seconds.
    async fn half_minute_reply() -> MockTicketSource {
        let source = MockTicketSource::with_tickets(vec![
            TicketBuilder::new(1)
                .status(2)
                .created("2025-12-14T10:00:00Z")
                .build(),
        ]);
        source
            .set_conversations(1, vec![agent_reply("2025-12-14T10:00:30Z")])
            .await;
        source
    }

    #[test]
    fn reduce_converts_then_guards() {
        let engine = engine_converting_with(&MockTicketSource::default(), whole_minutes);
        let (median, p90) = engine
            .reduce(&[10.0, 11.0], "median", "p90")
            .expect("valid sample");
        // median 10.5 -> 11, p90 10.9 -> 11
        assert_eq!(median, Some(11));
        assert_eq!(p90, Some(11));
        assert_eq!(
            engine.reduce(&[], "median", "p90").expect("empty ok"),
            (None, None)
        );
    }

    #[test]
    fn unconverted_fraction_is_a_contract_violation() {
        let engine = engine_converting_with(&MockTicketSource::default(), |m| m);
        let err = engine
            .reduce(&[10.0, 11.0], "median_frt_minutes", "p90_frt_minutes")
            .unwrap_err();
        assert!(err.is_contract_violation(), "{err}");
    }

    #[tokio::test]
    async fn contract_violation_fails_compute_and_is_not_cached() {
        let source = half_minute_reply().await;
        let engine = engine_converting_with(&source, |m| m);
        let request = KpiRequest::new(Metric::Frt);

        for _ in 0..2 {
            let err = engine.compute(&request).await.unwrap_err();
            assert!(
                matches!(
                    err,
                    DeskError::Contract(ContractViolation::NonIntegerMinutes { ref field, value })
                        if field == "median_frt_minutes" && value == 0.5
                ),
                "{err}"
            );
            assert!(engine.cache().is_empty());
        }
        // Each call recomputed from the source.
        assert_eq!(source.ticket_calls(), 2);
    }

    #[tokio::test]
    async fn sub_minute_samples_are_kept_until_conversion() {
        let source = half_minute_reply().await;
        let engine = KpiEngine::with_clock(
            Arc::new(source.clone()),
            KpiSettings::default(),
            || at("2025-12-20T10:00:00Z"),
        );
        let report = engine
            .compute_uncached(&KpiRequest::new(Metric::Frt))
            .await
            .expect("frt computes");
        let KpiReport::Frt(frt) = report else {
            panic!("expected frt report");
        };
        // 0.5 minutes rounds to 1; flooring the sample would report 0.
        assert_eq!(frt.median_frt_minutes, Some(1));
        assert_eq!(frt.sample_size, 1);
    }

    #[test]
    fn resolution_sample_uses_resolved_and_closed_only() {
        let tickets = vec![
            ticket(1, 4, "2025-12-14T10:00:00Z", "2025-12-14T11:00:00Z"),
            ticket(2, 5, "2025-12-14T10:00:00Z", "2025-12-14T12:00:00Z"),
            ticket(3, 2, "2025-12-14T10:00:00Z", "2025-12-14T13:00:00Z"),
            // updated before created
            ticket(4, 5, "2025-12-14T10:00:00Z", "2025-12-14T09:00:00Z"),
        ];
        assert_eq!(resolution_sample(&tickets), vec![60.0, 120.0]);
    }

    #[test]
    fn backlog_report_counts_only_open_statuses() {
        let tickets = vec![
            ticket(1, 2, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
            ticket(2, 3, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
            ticket(3, 4, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
            ticket(4, 5, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
            ticket(5, 6, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
            ticket(6, 1, "2025-12-14T10:00:00Z", "2025-12-14T10:00:00Z"),
        ];
        let report = backlog(&tickets).expect("consistent backlog");
        assert_eq!(report.current_backlog, 3);
        assert!(report.tickets.iter().all(|t| matches!(t.status, 2 | 3 | 6)));
    }

    #[test]
    fn future_creation_has_zero_age() {
        assert_eq!(
            age_minutes(at("2025-12-14T11:00:00Z"), at("2025-12-14T10:00:00Z")),
            0
        );
        assert_eq!(
            age_minutes(at("2025-12-12T10:00:00Z"), at("2025-12-14T10:30:00Z")),
            2 * MINUTES_PER_DAY + 30
        );
    }

    #[test]
    fn settings_follow_config() {
        let mut config = DeskpulseConfig::default();
        config.cache.ttl_secs = 30;
        config.kpi.frt_sample_limit = 5;
        let settings = KpiSettings::from_config(&config);
        assert_eq!(settings.cache_ttl, Duration::from_secs(30));
        assert_eq!(settings.frt_sample_limit, 5);
        assert_eq!(KpiSettings::default().cache_ttl, Duration::from_secs(120));
    }
}
