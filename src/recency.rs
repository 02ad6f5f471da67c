//! Short-window recent intimacy
//!
//! Each trailing window is scored independently with its own cohort
//! distribution, so a contact's 30-day and 90-day scores are not numerically
//! comparable. Contacts with no in-window activity score 0; the life-share
//! term compares a contact's in-window hours to the observer's own online
//! hours and collapses to 0 when the observer has none recorded.

use crate::cohort::{median, percentile_rank, ratio_sigmoid, sorted_values};
use crate::types::{RecencyScore, WindowActivity};

const TIME_WEIGHT: f64 = 40.0;
const FREQ_WEIGHT: f64 = 30.0;
const SHARE_WEIGHT: f64 = 30.0;

/// Score one window for every contact.
///
/// `activity` holds each contact's in-window hours and meets for the same
/// window; results come back in input order.
pub fn score_window(activity: &[WindowActivity], observer_hours: f64) -> Vec<RecencyScore> {
    let hours_sorted = sorted_values(activity.iter().filter(|a| a.hours > 0.0).map(|a| a.hours));
    let meets_sorted = sorted_values(
        activity
            .iter()
            .filter(|a| a.meets > 0)
            .map(|a| a.meets as f64),
    );

    let shares_sorted = if observer_hours > 0.0 {
        sorted_values(
            activity
                .iter()
                .filter(|a| a.hours > 0.0)
                .map(|a| a.hours / observer_hours),
        )
    } else {
        Vec::new()
    };
    let median_share = median(&shares_sorted).unwrap_or(0.01);

    activity
        .iter()
        .map(|a| {
            if a.hours <= 0.0 {
                return RecencyScore {
                    window_days: a.window_days,
                    ..RecencyScore::default()
                };
            }

            let time_score = percentile_rank(a.hours, &hours_sorted) * TIME_WEIGHT;
            let freq_score = percentile_rank(a.meets as f64, &meets_sorted) * FREQ_WEIGHT;

            let (life_share, share_score) = if observer_hours > 0.0 {
                let share = a.hours / observer_hours;
                (share, ratio_sigmoid(share, median_share) * SHARE_WEIGHT)
            } else {
                (0.0, 0.0)
            };

            RecencyScore {
                window_days: a.window_days,
                recent_hours: a.hours,
                recent_meets: a.meets,
                life_share,
                time_score,
                freq_score,
                share_score,
                intimacy: time_score + freq_score + share_score,
            }
        })
        .collect()
}
