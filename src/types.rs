//! Core types for the scoring pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: declared contacts, per-contact metric snapshots, and the final
//! score records consumed by the report and graph exporters.

use serde::{Deserialize, Serialize};

/// How a node entered the contact list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// Present in the declared contact list
    Friend,
    /// Only reachable through mutual-connection records
    MutualOnly,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Friend => "friend",
            ContactKind::MutualOnly => "mutual_only",
        }
    }
}

/// A declared contact, immutable for the duration of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque stable user id
    pub user_id: String,
    /// Display label; falls back to the user id when empty
    pub display_name: String,
    /// Platform trust level, empty when the source does not record one
    pub trust_level: String,
    pub kind: ContactKind,
}

impl Contact {
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.user_id
        } else {
            &self.display_name
        }
    }
}

/// Raw in-window activity for one contact and one trailing window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WindowActivity {
    /// Window length in days, counted back from the reference instant
    pub window_days: u32,
    /// Summed session hours inside the window (durations clamped at zero)
    pub hours: f64,
    /// Sessions inside the window with a positive duration
    pub meets: u32,
}

/// Per-contact scalar snapshot, valid for one reference instant and one
/// parameter set. Recomputed wholesale each run, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMetrics {
    pub user_id: String,
    /// Undecayed sum of session hours
    pub total_hours: f64,
    /// Decay-weighted sum of session hours as of the reference instant
    pub effective_hours: f64,
    /// effective_hours / total_hours, 0 when total_hours is 0
    pub retention_rate: f64,
    /// Sessions with a positive duration
    pub interaction_count: u32,
    /// All departure events, including zero-duration ones
    pub meet_count: u32,
    /// Distinct calendar days with at least one departure event
    pub active_days: u32,
    /// Whole days between the first session and the reference instant
    pub days_known: i64,
    /// Declared mutual-connection count
    pub mutual_connections: u32,
    /// Raw 7-day window: summed hours and all meets (for export)
    pub hours_7d: f64,
    pub meets_7d: u32,
    /// Raw 30-day window: summed hours and all meets (for export)
    pub hours_30d: f64,
    pub meets_30d: u32,
    /// In-window activity per configured recency window, primary window first
    pub recent: Vec<WindowActivity>,
}

impl ContactMetrics {
    /// Average session length in hours; 0 when there were no timed sessions
    pub fn avg_session_hours(&self) -> f64 {
        if self.interaction_count > 0 {
            self.total_hours / self.interaction_count as f64
        } else {
            0.0
        }
    }
}

/// Long-term relationship strength, decomposed into its four sub-scores
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StrengthScore {
    /// Percentile rank of effective hours within the cohort
    pub depth_percentile: f64,
    /// Depth sub-score, capped at 40
    pub depth_score: f64,
    /// Interaction-quality sub-score, capped at 25
    pub quality_score: f64,
    /// Stability sub-score, capped at 20
    pub stability_score: f64,
    /// Social-bond sub-score, capped at 15
    pub bond_score: f64,
    /// Weighted sum of the four sub-scores, in [0, 100]
    pub strength: f64,
    /// High interaction volume with zero declared mutual connections
    pub is_hidden: bool,
}

/// Short-window intimacy for one trailing window
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecencyScore {
    pub window_days: u32,
    /// Summed session hours inside the window
    pub recent_hours: f64,
    /// Sessions with a positive duration inside the window
    pub recent_meets: u32,
    /// Fraction of the observer's own in-window hours spent with this contact
    pub life_share: f64,
    /// Recent-time sub-score, capped at 40
    pub time_score: f64,
    /// Recent-frequency sub-score, capped at 30
    pub freq_score: f64,
    /// Life-share sub-score, capped at 30
    pub share_score: f64,
    /// Sum of the three sub-scores, in [0, 100]
    pub intimacy: f64,
}

/// Final per-contact record: metrics plus both score families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub contact: Contact,
    pub metrics: ContactMetrics,
    pub strength: StrengthScore,
    /// One entry per configured window, aligned with `metrics.recent`
    pub recency: Vec<RecencyScore>,
}

impl ScoreResult {
    /// Intimacy for the primary (first configured) window, 0 when no window ran
    pub fn recent_intimacy(&self) -> f64 {
        self.recency.first().map(|r| r.intimacy).unwrap_or(0.0)
    }

    /// Life share for the primary window
    pub fn life_share(&self) -> f64 {
        self.recency.first().map(|r| r.life_share).unwrap_or(0.0)
    }

    /// Intimacy for a specific window length, if that window was computed
    pub fn intimacy_for(&self, window_days: u32) -> Option<f64> {
        self.recency
            .iter()
            .find(|r| r.window_days == window_days)
            .map(|r| r.intimacy)
    }
}
