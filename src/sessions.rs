//! Session store
//!
//! Builds the immutable per-contact session table from raw departure events:
//! clamped session durations, one daily bucket per calendar day, first-seen
//! tracking, and the global date range that fixes the reference instant.
//! Orphan events for ids outside the declared contact list are dropped, but
//! they still extend the global date range, which is a property of the whole
//! log rather than of any one contact.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::store::{DepartureEvent, PresenceSample};
use crate::types::WindowActivity;

const MS_PER_HOUR: f64 = 3_600_000.0;

fn hours_from_ms(duration_ms: i64) -> f64 {
    duration_ms.max(0) as f64 / MS_PER_HOUR
}

/// One co-presence session, duration already clamped at zero
#[derive(Debug, Clone, Copy)]
pub struct SessionRecord {
    pub started_at: DateTime<Utc>,
    pub hours: f64,
}

/// Append-only session history of a single contact
#[derive(Debug, Clone, Default)]
pub struct ContactLog {
    sessions: Vec<SessionRecord>,
    daily_hours: BTreeMap<NaiveDate, f64>,
    first_seen: Option<DateTime<Utc>>,
    meet_count: u32,
    interaction_count: u32,
}

impl ContactLog {
    fn record(&mut self, event: &DepartureEvent) {
        let hours = hours_from_ms(event.duration_ms);

        if self.first_seen.map_or(true, |seen| event.occurred_at < seen) {
            self.first_seen = Some(event.occurred_at);
        }

        self.sessions.push(SessionRecord {
            started_at: event.occurred_at,
            hours,
        });
        *self
            .daily_hours
            .entry(event.occurred_at.date_naive())
            .or_insert(0.0) += hours;

        self.meet_count += 1;
        if event.duration_ms > 0 {
            self.interaction_count += 1;
        }
    }

    pub fn daily_hours(&self) -> &BTreeMap<NaiveDate, f64> {
        &self.daily_hours
    }

    /// Distinct calendar days with at least one departure event
    pub fn active_days(&self) -> u32 {
        self.daily_hours.len() as u32
    }

    pub fn meet_count(&self) -> u32 {
        self.meet_count
    }

    pub fn interaction_count(&self) -> u32 {
        self.interaction_count
    }

    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.first_seen
    }

    pub fn days_known(&self, now: DateTime<Utc>) -> i64 {
        self.first_seen
            .map(|seen| (now - seen).num_days().max(0))
            .unwrap_or(0)
    }

    /// In-window hours and positive-duration meets, for the recency cohort
    pub fn window_activity(&self, now: DateTime<Utc>, window_days: u32) -> WindowActivity {
        let cutoff = now - Duration::days(window_days as i64);
        let mut hours = 0.0;
        let mut meets = 0;
        for session in &self.sessions {
            if session.started_at >= cutoff {
                hours += session.hours;
                if session.hours > 0.0 {
                    meets += 1;
                }
            }
        }
        WindowActivity {
            window_days,
            hours,
            meets,
        }
    }

    /// In-window hours and all meets including zero-duration ones, for the
    /// raw export attributes
    pub fn raw_window(&self, now: DateTime<Utc>, window_days: u32) -> (f64, u32) {
        let cutoff = now - Duration::days(window_days as i64);
        let mut hours = 0.0;
        let mut meets = 0;
        for session in &self.sessions {
            if session.started_at >= cutoff {
                hours += session.hours;
                meets += 1;
            }
        }
        (hours, meets)
    }
}

/// Immutable per-contact session table for one analysis run
#[derive(Debug, Default)]
pub struct SessionStore {
    logs: BTreeMap<String, ContactLog>,
    reference_time: Option<DateTime<Utc>>,
    first_day: Option<NaiveDate>,
    last_day: Option<NaiveDate>,
}

impl SessionStore {
    /// Build the store from raw events, keeping only ids in `valid_ids`
    pub fn build(valid_ids: &HashSet<String>, events: &[DepartureEvent]) -> Self {
        let mut store = Self::default();

        for event in events {
            let day = event.occurred_at.date_naive();
            if store.first_day.map_or(true, |d| day < d) {
                store.first_day = Some(day);
            }
            if store.last_day.map_or(true, |d| day > d) {
                store.last_day = Some(day);
            }
            if store
                .reference_time
                .map_or(true, |t| event.occurred_at > t)
            {
                store.reference_time = Some(event.occurred_at);
            }

            if valid_ids.contains(&event.user_id) {
                store
                    .logs
                    .entry(event.user_id.clone())
                    .or_default()
                    .record(event);
            }
        }

        store
    }

    /// Maximum timestamp observed across the whole departure log
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    /// Calendar span of the departure log in whole days, at least 1
    pub fn total_log_days(&self) -> i64 {
        match (self.first_day, self.last_day) {
            (Some(first), Some(last)) => ((last - first).num_days() + 1).max(1),
            _ => 1,
        }
    }

    pub fn log(&self, user_id: &str) -> Option<&ContactLog> {
        self.logs.get(user_id)
    }

    pub fn contact_count(&self) -> usize {
        self.logs.len()
    }
}

/// The observer's own online-time log
#[derive(Debug, Default)]
pub struct ObserverLog {
    samples: Vec<PresenceSample>,
}

impl ObserverLog {
    pub fn new(samples: Vec<PresenceSample>) -> Self {
        Self { samples }
    }

    /// Distinct calendar days with at least one sample
    pub fn active_days(&self) -> u32 {
        let days: HashSet<NaiveDate> = self
            .samples
            .iter()
            .map(|s| s.occurred_at.date_naive())
            .collect();
        days.len() as u32
    }

    /// Summed online hours within the trailing window, durations clamped
    pub fn hours_within(&self, now: DateTime<Utc>, window_days: u32) -> f64 {
        let cutoff = now - Duration::days(window_days as i64);
        self.samples
            .iter()
            .filter(|s| s.occurred_at >= cutoff)
            .map(|s| hours_from_ms(s.duration_ms))
            .sum()
    }
}
