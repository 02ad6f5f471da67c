//! Cohort normalization primitives
//!
//! Both score families compare a contact against the full cohort of scored
//! contacts, so every helper here operates on a materialized, ascending-sorted
//! value vector. Percentile ranks use the strictly-less count, so the minimum
//! value ranks 0 and ties share the rank of the values below them. Ratio
//! normalization `x / (x + k)` is smooth, bounded in [0, 1), and insensitive
//! to outliers, with `k` floored to keep a degenerate cohort from producing
//! 0/0.

/// Minimum comparand for ratio normalization
pub const COMPARAND_FLOOR: f64 = 0.01;

/// Collect values into an ascending-sorted vector for rank lookups
pub fn sorted_values<I: IntoIterator<Item = f64>>(values: I) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Fraction of cohort values strictly below `value`; 0 for an empty cohort
pub fn percentile_rank(value: f64, sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let below = sorted.partition_point(|v| *v < value);
    below as f64 / sorted.len() as f64
}

/// Ratio normalization `x / (x + k)` with the comparand floored
pub fn ratio_sigmoid(x: f64, k: f64) -> f64 {
    let k = k.max(COMPARAND_FLOOR);
    x / (x + k)
}

/// Upper median of a sorted vector (`sorted[len / 2]`)
pub fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        None
    } else {
        Some(sorted[sorted.len() / 2])
    }
}

/// 70th-percentile pivot of a sorted vector (`sorted[floor(0.7 * len)]`);
/// 0 for an empty cohort
pub fn p70(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * 0.7) as usize;
    sorted[idx.min(sorted.len() - 1)]
}
