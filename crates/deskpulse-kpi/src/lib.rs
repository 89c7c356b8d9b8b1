// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service-level KPI computation for deskpulse.
//!
//! Tickets flow through the [`classifier`], minute samples through [`stats`],
//! final values through the [`contract`] guard, and whole computations are
//! memoized per request by the [`cache`]. [`KpiEngine`] wires these together
//! on top of a [`deskpulse_core::TicketSource`].

pub mod cache;
pub mod classifier;
pub mod contract;
pub mod definitions;
pub mod engine;
pub mod recording;
pub mod report;
pub mod request;
pub mod stats;

pub use cache::{CacheStatus, KpiCache};
pub use definitions::{KPI_CONTRACT_VERSION, KpiDefinition, definitions, definitions_document};
pub use engine::{Clock, ComputedReport, KpiEngine, KpiSettings, SystemClock};
pub use report::{KpiReport, KpiResponse};
pub use request::{DrilldownView, KpiRequest, Metric};
