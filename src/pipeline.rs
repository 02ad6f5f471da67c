//! Pipeline orchestration
//!
//! This module provides the public entry point of the crate. It drives the
//! full batch pipeline over a session log: load -> session store -> decay
//! aggregation -> cohort normalization -> relationship and recency scoring.
//! Everything runs in a single deterministic pass against the reference
//! instant (the maximum timestamp in the departure log, never wall-clock
//! time), so a frozen dataset always reproduces the same scores.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::decay;
use crate::error::AnalysisError;
use crate::params::{ResolvedParams, ScoringParams};
use crate::recency;
use crate::scorer;
use crate::sessions::{ContactLog, ObserverLog, SessionStore};
use crate::store::{SessionLogReader, EXCLUDED_IDS};
use crate::types::{Contact, ContactKind, ContactMetrics, ScoreResult, WindowActivity};

/// Outcome of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    /// One record per declared contact, ordered by user id
    pub results: Vec<ScoreResult>,
    /// Undirected mutual-connection edges between declared contacts,
    /// deduplicated as unordered pairs
    pub edges: Vec<(String, String)>,
    /// Parameter set after adaptive resolution
    pub params: ResolvedParams,
    /// Maximum timestamp in the departure log; `None` for an empty log
    pub reference_time: Option<DateTime<Utc>>,
    /// Observer's own online hours per configured window, aligned with
    /// `params.windows`
    pub observer_hours: Vec<(u32, f64)>,
}

impl Analysis {
    /// Contacts flagged as hidden relationships
    pub fn hidden(&self) -> impl Iterator<Item = &ScoreResult> {
        self.results.iter().filter(|r| r.strength.is_hidden)
    }
}

/// Run the full scoring pipeline over a session log.
///
/// The cohort normalization stages need every contact's raw metrics before
/// any score can be finalized, so this is a batch computation: all input is
/// materialized up front and no I/O happens during scoring.
pub fn analyze(
    reader: &dyn SessionLogReader,
    params: &ScoringParams,
) -> Result<Analysis, AnalysisError> {
    let observer_id = reader.observer_user_id();

    // Declared contact list, minus placeholder ids and the observer
    let mut contacts: BTreeMap<String, Contact> = BTreeMap::new();
    for record in reader.contacts()? {
        if EXCLUDED_IDS.contains(&record.user_id.as_str()) {
            continue;
        }
        if observer_id.as_deref() == Some(record.user_id.as_str()) {
            continue;
        }
        contacts.insert(
            record.user_id.clone(),
            Contact {
                user_id: record.user_id,
                display_name: record.display_name,
                trust_level: record.trust_level,
                kind: ContactKind::Friend,
            },
        );
    }
    info!("loaded {} declared contacts", contacts.len());

    let events = reader.departure_events()?;
    let links = reader.mutual_links()?;
    let samples = reader.observer_samples()?;

    let valid_ids: HashSet<String> = contacts.keys().cloned().collect();
    let store = SessionStore::build(&valid_ids, &events);
    let observer = ObserverLog::new(samples);

    let resolved = params.resolve(observer.active_days(), store.total_log_days())?;
    info!(
        "half-life {:.0} days{}, windows {:?}, activity factor {:.2}",
        resolved.half_life_days,
        if resolved.half_life_auto { " (auto)" } else { "" },
        resolved.windows,
        resolved.activity_factor,
    );

    // Mutual-connection counts per contact
    let mut connection_counts: HashMap<&str, u32> = HashMap::new();
    for link in &links {
        *connection_counts.entry(link.friend_id.as_str()).or_insert(0) += 1;
    }

    // Undirected edges restricted to declared endpoints
    let mut edge_set: BTreeSet<(String, String)> = BTreeSet::new();
    for link in &links {
        if link.friend_id == link.mutual_id {
            continue;
        }
        if valid_ids.contains(&link.friend_id) && valid_ids.contains(&link.mutual_id) {
            let (a, b) = if link.friend_id <= link.mutual_id {
                (link.friend_id.clone(), link.mutual_id.clone())
            } else {
                (link.mutual_id.clone(), link.friend_id.clone())
            };
            edge_set.insert((a, b));
        }
    }

    let reference_time = store.reference_time();
    let metrics: Vec<ContactMetrics> = contacts
        .values()
        .map(|contact| match (reference_time, store.log(&contact.user_id)) {
            (Some(now), Some(log)) => build_metrics(
                contact,
                log,
                now,
                &resolved,
                connection_counts
                    .get(contact.user_id.as_str())
                    .copied()
                    .unwrap_or(0),
            ),
            _ => empty_metrics(
                contact,
                &resolved,
                connection_counts
                    .get(contact.user_id.as_str())
                    .copied()
                    .unwrap_or(0),
            ),
        })
        .collect();

    let active = metrics.iter().filter(|m| m.total_hours > 0.0).count();
    debug!("{active} of {} contacts have recorded activity", metrics.len());

    let strengths = scorer::score_relationships(&metrics, resolved.total_log_days);

    // Each window is normalized against its own cohort
    let mut observer_hours = Vec::with_capacity(resolved.windows.len());
    let mut window_scores = Vec::with_capacity(resolved.windows.len());
    for (idx, &window) in resolved.windows.iter().enumerate() {
        let hours = match reference_time {
            Some(now) => observer.hours_within(now, window),
            None => 0.0,
        };
        observer_hours.push((window, hours));

        let activity: Vec<WindowActivity> = metrics
            .iter()
            .map(|m| {
                m.recent.get(idx).copied().unwrap_or(WindowActivity {
                    window_days: window,
                    ..WindowActivity::default()
                })
            })
            .collect();
        window_scores.push(recency::score_window(&activity, hours));
    }

    let results = contacts
        .into_values()
        .zip(metrics)
        .zip(strengths)
        .enumerate()
        .map(|(i, ((contact, metrics), strength))| ScoreResult {
            contact,
            metrics,
            strength,
            recency: window_scores.iter().map(|scores| scores[i]).collect(),
        })
        .collect();

    Ok(Analysis {
        results,
        edges: edge_set.into_iter().collect(),
        params: resolved,
        reference_time,
        observer_hours,
    })
}

fn build_metrics(
    contact: &Contact,
    log: &ContactLog,
    now: DateTime<Utc>,
    resolved: &ResolvedParams,
    mutual_connections: u32,
) -> ContactMetrics {
    let totals = decay::aggregate(log.daily_hours(), now.date_naive(), resolved.half_life_days);
    let (hours_7d, meets_7d) = log.raw_window(now, 7);
    let (hours_30d, meets_30d) = log.raw_window(now, 30);

    ContactMetrics {
        user_id: contact.user_id.clone(),
        total_hours: totals.total_hours,
        effective_hours: totals.effective_hours,
        retention_rate: totals.retention_rate,
        interaction_count: log.interaction_count(),
        meet_count: log.meet_count(),
        active_days: log.active_days(),
        days_known: log.days_known(now),
        mutual_connections,
        hours_7d,
        meets_7d,
        hours_30d,
        meets_30d,
        recent: resolved
            .windows
            .iter()
            .map(|&window| log.window_activity(now, window))
            .collect(),
    }
}

fn empty_metrics(
    contact: &Contact,
    resolved: &ResolvedParams,
    mutual_connections: u32,
) -> ContactMetrics {
    ContactMetrics {
        user_id: contact.user_id.clone(),
        total_hours: 0.0,
        effective_hours: 0.0,
        retention_rate: 0.0,
        interaction_count: 0,
        meet_count: 0,
        active_days: 0,
        days_known: 0,
        mutual_connections,
        hours_7d: 0.0,
        meets_7d: 0,
        hours_30d: 0.0,
        meets_30d: 0,
        recent: resolved
            .windows
            .iter()
            .map(|&window| WindowActivity {
                window_days: window,
                ..WindowActivity::default()
            })
            .collect(),
    }
}
