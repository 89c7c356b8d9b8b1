// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime checks for the KPI data contract.
//!
//! Every minute-valued field passes through [`finalize_minutes`] before it
//! is placed in a report. A violation is a program defect: it is logged at
//! `error!` and returned, never corrected.

use deskpulse_core::ContractViolation;
use tracing::error;

/// Checks an optional minute field.
///
/// `None` is accepted (no sample). A present value must be finite and
/// integral.
pub fn assert_minutes_field(name: &str, value: Option<f64>) -> Result<(), ContractViolation> {
    let Some(value) = value else {
        return Ok(());
    };
    if !value.is_finite() {
        let violation = ContractViolation::NotANumber {
            field: name.to_string(),
        };
        error!(field = name, %violation, "KPI contract violation");
        return Err(violation);
    }
    if value.fract() != 0.0 {
        let violation = ContractViolation::NonIntegerMinutes {
            field: name.to_string(),
            value,
        };
        error!(field = name, value, %violation, "KPI contract violation");
        return Err(violation);
    }
    Ok(())
}

/// Rejects a non-zero backlog computed over a set that contains resolved
/// (4) or closed (5) tickets.
pub fn assert_backlog_count_matches_statuses(
    backlog_count: usize,
    statuses_seen: &[i64],
) -> Result<(), ContractViolation> {
    let closed: Vec<i64> = statuses_seen
        .iter()
        .copied()
        .filter(|s| matches!(s, 4 | 5))
        .collect();
    if backlog_count > 0 && !closed.is_empty() {
        let violation = ContractViolation::BacklogIncludesClosed {
            backlog_count,
            statuses: closed,
        };
        error!(backlog_count, %violation, "KPI contract violation");
        return Err(violation);
    }
    Ok(())
}

/// Guards a minute field and converts it to the report's integer type.
pub fn finalize_minutes(name: &str, value: Option<f64>) -> Result<Option<u64>, ContractViolation> {
    assert_minutes_field(name, value)?;
    match value {
        None => Ok(None),
        Some(v) if v < 0.0 => {
            let violation = ContractViolation::NegativeMinutes {
                field: name.to_string(),
                value: v,
            };
            error!(field = name, value = v, %violation, "KPI contract violation");
            Err(violation)
        }
        Some(v) => Ok(Some(v as u64)),
    }
}
