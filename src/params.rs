//! Scoring parameters
//!
//! Half-life and recent-window lengths are either given explicitly or derived
//! from the observer's own activity ratio. More active observers get a shorter
//! half-life (their history is denser, so recency matters relatively more)
//! and a tighter recent window.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Bounds of the adaptive half-life in days
pub const AUTO_HALF_LIFE_MIN: f64 = 90.0;
pub const AUTO_HALF_LIFE_MAX: f64 = 180.0;

/// Bounds of the adaptive recent window in days
pub const AUTO_WINDOW_MIN: u32 = 30;
pub const AUTO_WINDOW_MAX: u32 = 60;

/// Decay half-life setting: explicit days or adaptive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfLife {
    Days(f64),
    Auto,
}

impl HalfLife {
    /// Parse a CLI-style override: a positive number of days or "auto"
    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        if value.eq_ignore_ascii_case("auto") {
            return Ok(HalfLife::Auto);
        }
        match value.parse::<f64>() {
            Ok(days) if days > 0.0 && days.is_finite() => Ok(HalfLife::Days(days)),
            _ => Err(AnalysisError::InvalidHalfLife(value.to_string())),
        }
    }
}

/// Recent-window setting: explicit days or adaptive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecentWindow {
    Days(u32),
    Auto,
}

impl RecentWindow {
    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        if value.eq_ignore_ascii_case("auto") {
            return Ok(RecentWindow::Auto);
        }
        match value.parse::<u32>() {
            Ok(days) if days > 0 => Ok(RecentWindow::Days(days)),
            _ => Err(AnalysisError::InvalidWindow(value.to_string())),
        }
    }
}

/// Tunable inputs of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringParams {
    pub half_life: HalfLife,
    /// Primary recency window; its intimacy and life share are the surfaced
    /// defaults
    pub recent_window: RecentWindow,
    /// Additional windows computed alongside the primary one, each with its
    /// own independent cohort normalization
    pub extra_windows: Vec<u32>,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            half_life: HalfLife::Auto,
            recent_window: RecentWindow::Auto,
            extra_windows: vec![30, 60, 90],
        }
    }
}

impl ScoringParams {
    /// Resolve adaptive settings against the observer's activity ratio.
    ///
    /// `activity_factor = min(observer_active_days / total_log_days, 1.0)`;
    /// `auto_half_life = 90 * (2 - activity_factor)`, bounded to [90, 180];
    /// `auto_window = 30 + (1 - activity_factor) * 30`, bounded to [30, 60].
    ///
    /// Fails fast on a non-positive explicit half-life or window, before any
    /// aggregation runs.
    pub fn resolve(
        &self,
        observer_active_days: u32,
        total_log_days: i64,
    ) -> Result<ResolvedParams, AnalysisError> {
        let total_days = total_log_days.max(1);
        let activity_factor = (observer_active_days as f64 / total_days as f64).min(1.0);

        let (half_life_days, half_life_auto) = match self.half_life {
            HalfLife::Days(days) => {
                if !(days > 0.0) || !days.is_finite() {
                    return Err(AnalysisError::InvalidHalfLife(days.to_string()));
                }
                (days, false)
            }
            HalfLife::Auto => (
                (90.0 * (2.0 - activity_factor)).clamp(AUTO_HALF_LIFE_MIN, AUTO_HALF_LIFE_MAX),
                true,
            ),
        };

        let (primary_window, window_auto) = match self.recent_window {
            RecentWindow::Days(days) => {
                if days == 0 {
                    return Err(AnalysisError::InvalidWindow(days.to_string()));
                }
                (days, false)
            }
            RecentWindow::Auto => {
                let window = 30 + ((1.0 - activity_factor) * 30.0) as u32;
                (window.clamp(AUTO_WINDOW_MIN, AUTO_WINDOW_MAX), true)
            }
        };

        let mut windows = vec![primary_window];
        for &extra in &self.extra_windows {
            if extra == 0 {
                return Err(AnalysisError::InvalidWindow(extra.to_string()));
            }
            if !windows.contains(&extra) {
                windows.push(extra);
            }
        }

        Ok(ResolvedParams {
            half_life_days,
            half_life_auto,
            windows,
            window_auto,
            activity_factor,
            observer_active_days,
            total_log_days: total_days,
        })
    }
}

/// Parameter set after adaptive resolution, fixed for the rest of the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedParams {
    pub half_life_days: f64,
    pub half_life_auto: bool,
    /// Configured windows, primary first, deduplicated
    pub windows: Vec<u32>,
    pub window_auto: bool,
    pub activity_factor: f64,
    pub observer_active_days: u32,
    pub total_log_days: i64,
}

impl ResolvedParams {
    pub fn primary_window(&self) -> u32 {
        self.windows.first().copied().unwrap_or(AUTO_WINDOW_MIN)
    }
}
