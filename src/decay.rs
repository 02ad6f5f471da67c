//! Time-decay aggregation
//!
//! Past interaction loses weight exponentially: a day's hours contribute
//! `hours * 2^(-age_days / half_life)` as of the reference instant. Effective
//! hours are the decayed sum, total hours the undecayed one, and the retention
//! rate measures how much of the history survives decay.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Decayed and undecayed totals for one contact
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayTotals {
    pub effective_hours: f64,
    pub total_hours: f64,
    /// effective_hours / total_hours, 0 when total_hours is 0
    pub retention_rate: f64,
}

/// Aggregate a contact's daily buckets as of `reference_day`.
///
/// Days after the reference day are clamped to age 0 rather than given a
/// weight above 1, so `effective_hours <= total_hours` always holds. The
/// half-life must be validated as positive before this runs.
pub fn aggregate(
    daily_hours: &BTreeMap<NaiveDate, f64>,
    reference_day: NaiveDate,
    half_life_days: f64,
) -> DecayTotals {
    let mut effective = 0.0;
    let mut total = 0.0;

    for (day, hours) in daily_hours {
        let age_days = (reference_day - *day).num_days().max(0) as f64;
        let weight = 2.0_f64.powf(-age_days / half_life_days);
        effective += hours * weight;
        total += hours;
    }

    let retention_rate = if total > 0.0 { effective / total } else { 0.0 };

    DecayTotals {
        effective_hours: effective,
        total_hours: total,
        retention_rate,
    }
}
