//! Session-log access
//!
//! The scoring engine is decoupled from any particular store through the
//! [`SessionLogReader`] trait: a reader yields the declared contact list,
//! departure events, mutual-connection links, and the observer's own presence
//! samples. [`SqliteLogReader`] implements the trait over the co-presence
//! database layout.

mod sqlite;

pub use sqlite::SqliteLogReader;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Placeholder ids that never denote a real contact
pub const EXCLUDED_IDS: &[&str] = &["usr_00000000-0000-0000-0000-000000000000"];

/// One row of the declared contact list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub user_id: String,
    pub display_name: String,
    /// Empty when the source table has no trust column
    pub trust_level: String,
}

/// A departure event: a contact left the observer's instance after sharing it
/// for `duration_ms` milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartureEvent {
    pub user_id: String,
    pub occurred_at: DateTime<Utc>,
    /// May be zero or negative in the raw log; consumers clamp at zero
    pub duration_ms: i64,
}

/// One declared mutual-connection link between two contacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutualLink {
    pub friend_id: String,
    pub mutual_id: String,
}

/// A sample of the observer's own online time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceSample {
    pub occurred_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Capability the scoring engine needs from a session log
pub trait SessionLogReader {
    /// The declared contact list, one record per contact
    fn contacts(&self) -> Result<Vec<ContactRecord>, AnalysisError>;

    /// All departure events, in no particular order
    fn departure_events(&self) -> Result<Vec<DepartureEvent>, AnalysisError>;

    /// All declared mutual-connection links
    fn mutual_links(&self) -> Result<Vec<MutualLink>, AnalysisError>;

    /// The observer's own online-time samples
    fn observer_samples(&self) -> Result<Vec<PresenceSample>, AnalysisError>;

    /// The observer's own user id, when the store can derive it
    fn observer_user_id(&self) -> Option<String> {
        None
    }
}
