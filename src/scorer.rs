//! Long-term relationship strength
//!
//! Weighted sum of four independently capped sub-scores:
//!
//! | Sub-score | Weight | Input |
//! |-----------|--------|-------|
//! | Depth     | 40     | percentile rank of effective hours |
//! | Quality   | 25     | ratio of average session length to the cohort median |
//! | Stability | 20     | sqrt of the active-day ratio |
//! | Bond      | 15     | percentile rank of mutual connections |
//!
//! A contact with zero declared mutual connections but interaction volume
//! above the cohort's 70th percentile is flagged as a hidden relationship and
//! scores Bond from its own Depth percentile instead of the neutral default:
//! high engagement with no visible mutual link signals an undisclosed tie,
//! not an unknown one.

use crate::cohort::{median, p70, percentile_rank, ratio_sigmoid, sorted_values};
use crate::types::{ContactMetrics, StrengthScore};

const DEPTH_WEIGHT: f64 = 40.0;
const QUALITY_WEIGHT: f64 = 25.0;
const STABILITY_WEIGHT: f64 = 20.0;
const BOND_WEIGHT: f64 = 15.0;

/// Bond sub-score for an ordinary contact with no mutual connections
const BOND_NEUTRAL: f64 = 7.5;

/// Score every contact against the cohort of contacts with any activity.
///
/// Returns one score per input, in input order. Contacts with zero total
/// hours are excluded from the cohort and receive an all-zero score.
pub fn score_relationships(metrics: &[ContactMetrics], total_log_days: i64) -> Vec<StrengthScore> {
    let active: Vec<&ContactMetrics> = metrics.iter().filter(|m| m.total_hours > 0.0).collect();

    let effective_sorted = sorted_values(active.iter().map(|m| m.effective_hours));
    let hours_sorted = sorted_values(active.iter().map(|m| m.total_hours));
    let meets_sorted = sorted_values(
        active
            .iter()
            .filter(|m| m.meet_count > 0)
            .map(|m| m.meet_count as f64),
    );
    let avg_sorted = sorted_values(
        active
            .iter()
            .filter(|m| m.interaction_count > 0)
            .map(|m| m.avg_session_hours()),
    );
    let connections_sorted = sorted_values(
        active
            .iter()
            .filter(|m| m.mutual_connections > 0)
            .map(|m| m.mutual_connections as f64),
    );

    let median_avg_duration = median(&avg_sorted).unwrap_or(1.0);
    let hours_pivot = p70(&hours_sorted);
    let meets_pivot = p70(&meets_sorted);
    let total_days = total_log_days.max(1) as f64;

    metrics
        .iter()
        .map(|m| {
            if m.total_hours <= 0.0 {
                return StrengthScore::default();
            }

            let depth_percentile = percentile_rank(m.effective_hours, &effective_sorted);
            let depth_score = depth_percentile * DEPTH_WEIGHT;

            let quality_score =
                ratio_sigmoid(m.avg_session_hours(), median_avg_duration) * QUALITY_WEIGHT;

            let stability_ratio = (m.active_days as f64 / total_days).min(1.0);
            let stability_score = stability_ratio.sqrt() * STABILITY_WEIGHT;

            let mut is_hidden = false;
            let bond_score = if m.mutual_connections > 0 {
                percentile_rank(m.mutual_connections as f64, &connections_sorted) * BOND_WEIGHT
            } else {
                let high_interaction =
                    m.total_hours > hours_pivot || m.meet_count as f64 > meets_pivot;
                if high_interaction {
                    is_hidden = true;
                    depth_percentile * BOND_WEIGHT
                } else {
                    BOND_NEUTRAL
                }
            };

            StrengthScore {
                depth_percentile,
                depth_score,
                quality_score,
                stability_score,
                bond_score,
                strength: depth_score + quality_score + stability_score + bond_score,
                is_hidden,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(user_id: &str, total_hours: f64, effective_hours: f64) -> ContactMetrics {
        ContactMetrics {
            user_id: user_id.to_string(),
            total_hours,
            effective_hours,
            retention_rate: if total_hours > 0.0 {
                effective_hours / total_hours
            } else {
                0.0
            },
            interaction_count: if total_hours > 0.0 { 10 } else { 0 },
            meet_count: if total_hours > 0.0 { 10 } else { 0 },
            active_days: 5,
            days_known: 100,
            mutual_connections: 0,
            hours_7d: 0.0,
            meets_7d: 0,
            hours_30d: 0.0,
            meets_30d: 0,
            recent: Vec::new(),
        }
    }

    fn cohort_of_ten() -> Vec<ContactMetrics> {
        (1..=10)
            .map(|i| {
                let mut m = metrics(&format!("usr_{i}"), i as f64 * 10.0, i as f64 * 5.0);
                m.mutual_connections = i as u32;
                m
            })
            .collect()
    }

    #[test]
    fn test_scores_bounded() {
        let cohort = cohort_of_ten();
        for score in score_relationships(&cohort, 365) {
            assert!(score.strength >= 0.0 && score.strength <= 100.0);
            assert!(score.depth_score <= 40.0);
            assert!(score.quality_score <= 25.0);
            assert!(score.stability_score <= 20.0);
            assert!(score.bond_score <= 15.0);
            assert!(score.strength.is_finite());
        }
    }

    #[test]
    fn test_inactive_contact_scores_zero() {
        let mut cohort = cohort_of_ten();
        cohort.push(metrics("usr_idle", 0.0, 0.0));

        let scores = score_relationships(&cohort, 365);
        let idle = scores.last().unwrap();
        assert_eq!(idle.strength, 0.0);
        assert!(!idle.is_hidden);
    }

    #[test]
    fn test_empty_cohort_yields_no_scores() {
        assert!(score_relationships(&[], 365).is_empty());
    }

    #[test]
    fn test_hidden_relationship_detected() {
        let mut cohort = cohort_of_ten();
        // Heaviest contact in the cohort, but zero declared connections
        let mut covert = metrics("usr_covert", 500.0, 400.0);
        covert.mutual_connections = 0;
        covert.meet_count = 200;
        cohort.push(covert);

        let scores = score_relationships(&cohort, 365);
        let covert_score = scores.last().unwrap();
        assert!(covert_score.is_hidden);
        // Bond substitutes the depth percentile instead of the neutral 7.5
        assert!(
            (covert_score.bond_score - covert_score.depth_percentile * 15.0).abs() < 1e-9
        );
        assert!(covert_score.bond_score > 7.5);
    }

    #[test]
    fn test_low_activity_zero_connections_not_hidden() {
        let mut cohort = cohort_of_ten();
        let mut casual = metrics("usr_casual", 1.0, 0.5);
        casual.mutual_connections = 0;
        casual.meet_count = 1;
        cohort.push(casual);

        let scores = score_relationships(&cohort, 365);
        let casual_score = scores.last().unwrap();
        assert!(!casual_score.is_hidden);
        assert_eq!(casual_score.bond_score, 7.5);
    }

    #[test]
    fn test_stability_caps_at_full_ratio() {
        let mut m = metrics("usr_daily", 100.0, 90.0);
        m.active_days = 50;
        // More active days than log days must not push the score above 20
        let scores = score_relationships(&[m], 10);
        assert!((scores[0].stability_score - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_depth_rewards_effective_hours() {
        let mut a = metrics("usr_a", 100.0, 90.0);
        let mut b = metrics("usr_b", 100.0, 10.0);
        a.mutual_connections = 1;
        b.mutual_connections = 1;

        let scores = score_relationships(&[a, b], 365);
        assert!(scores[0].depth_score > scores[1].depth_score);
    }
}
