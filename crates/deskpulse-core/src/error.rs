// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the deskpulse KPI engine.

use std::sync::Arc;

use thiserror::Error;

/// Shared, clonable error source.
///
/// Sources are reference counted so a single failure can be handed to every
/// caller joined on the same in-flight computation.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// The primary error type used across deskpulse crates.
#[derive(Debug, Clone, Error)]
pub enum DeskError {
    /// Configuration errors (invalid TOML, missing credentials, bad limits).
    #[error("configuration error: {0}")]
    Config(String),

    /// The helpdesk API could not be reached or answered with a failure.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        /// HTTP status code, when the failure came from a response.
        status: Option<u16>,
        source: Option<ErrorSource>,
    },

    /// An upstream payload could not be decoded into the ticket model.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<ErrorSource>,
    },

    /// A computed KPI broke the data contract. Always a program defect.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// Returns the upstream HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            DeskError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// True for contract violations, which must never be swallowed.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, DeskError::Contract(_))
    }
}

/// A breach of the KPI data contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// A minute field held NaN or an infinite value.
    #[error("{field} must be a number (minutes)")]
    NotANumber { field: String },

    /// A minute field held a fractional value, usually hours passed as minutes.
    #[error("{field} must be integer minutes (got non-integer {value})")]
    NonIntegerMinutes { field: String, value: f64 },

    /// A minute field held a negative value, usually a sign error in a delta.
    #[error("{field} must be non-negative minutes (got {value})")]
    NegativeMinutes { field: String, value: f64 },

    /// A non-zero backlog was reported over a set containing resolved/closed tickets.
    #[error("backlog included resolved/closed statuses: {}", join_statuses(statuses))]
    BacklogIncludesClosed {
        backlog_count: usize,
        statuses: Vec<i64>,
    },
}

fn join_statuses(statuses: &[i64]) -> String {
    statuses
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
