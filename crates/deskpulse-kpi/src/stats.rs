// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durations in minutes and order statistics over minute samples.
//!
//! Every metric goes through these functions; none of them keeps state.

use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// `end - start` in real minutes (millisecond precision).
///
/// Negative when `end` precedes `start`; callers decide whether to keep it.
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_MINUTE
}

/// Whole elapsed minutes for ticket ages, `None` when `end` precedes `start`.
pub fn elapsed_whole_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<u64> {
    let minutes = minutes_between(start, end);
    (minutes >= 0.0).then(|| minutes.floor() as u64)
}

/// Converts a reduced statistic to whole minutes (half away from zero).
///
/// The only place a statistic is made integral. The contract guard checks
/// the result afterwards and never rounds anything itself.
pub fn whole_minutes(value: f64) -> f64 {
    value.round()
}

/// Median of the sample, `None` when empty.
pub fn median(sample: &[f64]) -> Option<f64> {
    let sorted = sorted(sample);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Percentile by linear interpolation between closest ranks.
///
/// `p` is a fraction in `[0, 1]`; values outside are clamped, NaN yields
/// `None`. The fractional rank is `p * (n - 1)`.
pub fn percentile(sample: &[f64], p: f64) -> Option<f64> {
    if sample.is_empty() || p.is_nan() {
        return None;
    }
    let sorted = sorted(sample);
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// 90th percentile.
pub fn p90(sample: &[f64]) -> Option<f64> {
    percentile(sample, 0.9)
}

fn sorted(sample: &[f64]) -> Vec<f64> {
    let mut values = sample.to_vec();
    values.sort_by(f64::total_cmp);
    values
}
