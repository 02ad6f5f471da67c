//! Affinity Graph - scoring engine for co-presence session logs
//!
//! The crate turns a log of timestamped co-presence sessions into comparable
//! per-contact scores through a deterministic batch pipeline: session store ->
//! time-decay aggregation -> cohort normalization -> relationship and recency
//! scoring. The scored table feeds a ranking report, CSV exports, and a GEXF
//! graph of the mutual-connection network.
//!
//! ## Modules
//!
//! - **store**: session-log access behind the [`store::SessionLogReader`]
//!   trait, with a SQLite implementation
//! - **pipeline**: the [`pipeline::analyze`] entry point
//! - **report** / **gexf**: read-only consumers of the scored table

pub mod cohort;
pub mod decay;
pub mod error;
pub mod gexf;
pub mod params;
pub mod pipeline;
pub mod recency;
pub mod report;
pub mod scorer;
pub mod sessions;
pub mod store;
pub mod types;

pub use error::AnalysisError;
pub use params::{HalfLife, RecentWindow, ScoringParams};
pub use pipeline::{analyze, Analysis};
pub use store::{SessionLogReader, SqliteLogReader};
pub use types::{Contact, ContactMetrics, ScoreResult};

/// Crate version embedded in exported artifacts
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
