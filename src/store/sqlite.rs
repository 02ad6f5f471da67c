//! SQLite session-log reader
//!
//! Reads the co-presence database layout: a per-user contact table
//! `{prefix}_friend_log_current`, mutual-connection links in
//! `{prefix}_mutual_graph_links`, and the unprefixed `gamelog_join_leave` /
//! `gamelog_location` event tables. The prefix is auto-detected from the
//! contact table name unless given explicitly.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use rusqlite::Connection;

use crate::error::AnalysisError;
use crate::store::{
    ContactRecord, DepartureEvent, MutualLink, PresenceSample, SessionLogReader,
};

const CONTACT_TABLE_SUFFIX: &str = "_friend_log_current";
const LINK_TABLE_SUFFIX: &str = "_mutual_graph_links";

pub struct SqliteLogReader {
    conn: Connection,
    prefix: String,
    observer_id: Option<String>,
}

impl SqliteLogReader {
    /// Open a database and detect its table prefix.
    ///
    /// An explicit prefix may be a bare prefix or a full table name; known
    /// suffixes are stripped.
    pub fn open(path: &Path, explicit_prefix: Option<&str>) -> Result<Self, AnalysisError> {
        let conn = Connection::open(path)?;
        let prefix = detect_prefix(&conn, explicit_prefix)?;
        let observer_id = observer_id_from_prefix(&prefix);
        info!("using table prefix {prefix}");

        Ok(Self {
            conn,
            prefix,
            observer_id,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn contact_table(&self) -> Result<String, AnalysisError> {
        checked_table_name(&format!("{}{CONTACT_TABLE_SUFFIX}", self.prefix))
    }

    fn link_table(&self) -> Result<String, AnalysisError> {
        checked_table_name(&format!("{}{LINK_TABLE_SUFFIX}", self.prefix))
    }
}

impl SessionLogReader for SqliteLogReader {
    fn contacts(&self) -> Result<Vec<ContactRecord>, AnalysisError> {
        let table = self.contact_table()?;

        // Older databases have no trust_level column
        let with_trust = self
            .conn
            .prepare(&format!(
                "SELECT user_id, display_name, trust_level FROM {table}"
            ))
            .and_then(|mut stmt| {
                let rows = stmt.query_map([], |row| {
                    Ok(ContactRecord {
                        user_id: row.get(0)?,
                        display_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        trust_level: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            });

        let records = match with_trust {
            Ok(records) => records,
            Err(_) => {
                debug!("contact table has no trust_level column, falling back");
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT user_id, display_name FROM {table}"))?;
                let rows = stmt.query_map([], |row| {
                    Ok(ContactRecord {
                        user_id: row.get(0)?,
                        display_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        trust_level: String::new(),
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(records
            .into_iter()
            .filter(|r| !r.user_id.is_empty())
            .collect())
    }

    fn departure_events(&self) -> Result<Vec<DepartureEvent>, AnalysisError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, created_at, time FROM gamelog_join_leave
             WHERE type = 'OnPlayerLeft' AND user_id IS NOT NULL AND user_id != ''",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (user_id, created_at, duration_ms) = row?;
            match parse_timestamp(&created_at) {
                Some(occurred_at) => events.push(DepartureEvent {
                    user_id,
                    occurred_at,
                    duration_ms,
                }),
                None => debug!("skipping departure row with bad timestamp {created_at:?}"),
            }
        }
        Ok(events)
    }

    fn mutual_links(&self) -> Result<Vec<MutualLink>, AnalysisError> {
        let table = self.link_table()?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT friend_id, mutual_id FROM {table}"))?;
        let rows = stmt.query_map([], |row| {
            Ok(MutualLink {
                friend_id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                mutual_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        let mut links = Vec::new();
        for row in rows {
            let link = row?;
            if !link.friend_id.is_empty() && !link.mutual_id.is_empty() {
                links.push(link);
            }
        }
        Ok(links)
    }

    fn observer_samples(&self) -> Result<Vec<PresenceSample>, AnalysisError> {
        let mut stmt = self
            .conn
            .prepare("SELECT created_at, time FROM gamelog_location")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            ))
        })?;

        let mut samples = Vec::new();
        for row in rows {
            let (created_at, duration_ms) = row?;
            match parse_timestamp(&created_at) {
                Some(occurred_at) => samples.push(PresenceSample {
                    occurred_at,
                    duration_ms,
                }),
                None => debug!("skipping location row with bad timestamp {created_at:?}"),
            }
        }
        Ok(samples)
    }

    fn observer_user_id(&self) -> Option<String> {
        self.observer_id.clone()
    }
}

fn detect_prefix(
    conn: &Connection,
    explicit_prefix: Option<&str>,
) -> Result<String, AnalysisError> {
    if let Some(prefix) = explicit_prefix {
        return Ok(normalize_prefix(prefix));
    }

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ?1",
    )?;
    let pattern = format!("%{CONTACT_TABLE_SUFFIX}");
    let rows = stmt.query_map([pattern], |row| row.get::<_, String>(0))?;

    let mut prefixes: Vec<String> = Vec::new();
    for row in rows {
        let name = row?;
        if let Some(prefix) = name.strip_suffix(CONTACT_TABLE_SUFFIX) {
            prefixes.push(prefix.to_string());
        }
    }
    prefixes.sort();
    prefixes.dedup();

    match prefixes.len() {
        0 => Err(AnalysisError::NoContactTable),
        1 => Ok(prefixes.remove(0)),
        _ => Err(AnalysisError::AmbiguousPrefix(prefixes.join(", "))),
    }
}

fn normalize_prefix(value: &str) -> String {
    for suffix in [CONTACT_TABLE_SUFFIX, LINK_TABLE_SUFFIX] {
        if let Some(stripped) = value.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    value.to_string()
}

/// Table names are interpolated into SQL, so they must stay plain identifiers
fn checked_table_name(name: &str) -> Result<String, AnalysisError> {
    let safe = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if safe {
        Ok(name.to_string())
    } else {
        Err(AnalysisError::UnsafeTableName(name.to_string()))
    }
}

/// Derive the observer's canonical user id from a `usr<32 hex chars>` prefix
fn observer_id_from_prefix(prefix: &str) -> Option<String> {
    let raw = prefix.strip_prefix("usr")?;
    if raw.len() != 32 {
        return None;
    }
    Some(format!(
        "usr_{}-{}-{}-{}-{}",
        &raw[..8],
        &raw[8..12],
        &raw[12..16],
        &raw[16..20],
        &raw[20..]
    ))
}

/// Timestamps appear both as RFC 3339 and as bare `YYYY-MM-DD HH:MM:SS` text
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    None
}
