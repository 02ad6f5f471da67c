//! End-to-end tests over an on-disk SQLite session log

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection};
use tempfile::TempDir;

use affinity_graph::params::{HalfLife, RecentWindow, ScoringParams};
use affinity_graph::store::SessionLogReader;
use affinity_graph::{analyze, gexf, report, AnalysisError, SqliteLogReader};

const PREFIX: &str = "usr0123456789abcdef0123456789abcdef";
const OBSERVER_ID: &str = "usr_01234567-89ab-cdef-0123-456789abcdef";

struct Fixture {
    _dir: TempDir,
    path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("log.sqlite3");
        let conn = Connection::open(&path).expect("open fixture db");
        conn.execute_batch(&format!(
            "CREATE TABLE {PREFIX}_friend_log_current (
                 user_id TEXT, display_name TEXT, trust_level TEXT
             );
             CREATE TABLE {PREFIX}_mutual_graph_links (
                 friend_id TEXT, mutual_id TEXT
             );
             CREATE TABLE gamelog_join_leave (
                 id INTEGER PRIMARY KEY, created_at TEXT, type TEXT,
                 user_id TEXT, time INTEGER, location TEXT
             );
             CREATE TABLE gamelog_location (
                 id INTEGER PRIMARY KEY, created_at TEXT, time INTEGER
             );",
        ))
        .expect("create schema");
        Self { _dir: dir, path }
    }

    fn conn(&self) -> Connection {
        Connection::open(&self.path).expect("reopen fixture db")
    }

    fn add_friend(&self, user_id: &str, name: &str) {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO {PREFIX}_friend_log_current (user_id, display_name, trust_level)
                     VALUES (?1, ?2, 'known')"
                ),
                params![user_id, name],
            )
            .expect("insert friend");
    }

    fn add_link(&self, friend_id: &str, mutual_id: &str) {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO {PREFIX}_mutual_graph_links (friend_id, mutual_id)
                     VALUES (?1, ?2)"
                ),
                params![friend_id, mutual_id],
            )
            .expect("insert link");
    }

    fn add_departure(&self, user_id: &str, at: DateTime<Utc>, duration_ms: i64) {
        self.conn()
            .execute(
                "INSERT INTO gamelog_join_leave (created_at, type, user_id, time, location)
                 VALUES (?1, 'OnPlayerLeft', ?2, ?3, 'wrld_x:1')",
                params![at.to_rfc3339(), user_id, duration_ms],
            )
            .expect("insert departure");
    }

    fn add_presence(&self, at: DateTime<Utc>, duration_ms: i64) {
        self.conn()
            .execute(
                "INSERT INTO gamelog_location (created_at, time) VALUES (?1, ?2)",
                params![at.to_rfc3339(), duration_ms],
            )
            .expect("insert presence");
    }
}

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 20, 0, 0).unwrap()
}

fn fixed_params() -> ScoringParams {
    ScoringParams {
        half_life: HalfLife::Days(120.0),
        recent_window: RecentWindow::Days(30),
        extra_windows: vec![60, 90],
    }
}

#[test]
fn full_pipeline_over_sqlite_log() {
    let fixture = Fixture::new();
    let end = reference();

    fixture.add_friend("usr_close", "Close Friend");
    fixture.add_friend("usr_faded", "Faded Friend");
    fixture.add_friend(OBSERVER_ID, "Me");
    fixture.add_link("usr_close", "usr_faded");
    fixture.add_link("usr_faded", "usr_close");

    // Close friend: 30 two-hour sessions over the last two months
    for i in 0..30 {
        fixture.add_departure("usr_close", end - Duration::days(i * 2), 7_200_000);
    }
    // Faded friend: the same volume, but all of it 8-14 months ago
    for i in 0..30 {
        fixture.add_departure("usr_faded", end - Duration::days(240 + i * 6), 7_200_000);
    }
    // Observer online time
    for i in 0..60 {
        fixture.add_presence(end - Duration::days(i), 4 * 3_600_000);
    }

    let reader = SqliteLogReader::open(&fixture.path, None).expect("open reader");
    assert_eq!(reader.prefix(), PREFIX);
    assert_eq!(reader.observer_user_id().as_deref(), Some(OBSERVER_ID));

    let analysis = analyze(&reader, &fixed_params()).expect("analysis");

    // The observer row is excluded from the scored contacts
    assert_eq!(analysis.results.len(), 2);
    assert_eq!(analysis.reference_time, Some(end));
    assert_eq!(analysis.edges.len(), 1);

    let close = &analysis.results[0];
    let faded = &analysis.results[1];
    assert_eq!(close.contact.user_id, "usr_close");
    assert!((close.metrics.total_hours - 60.0).abs() < 1e-6);
    assert!((faded.metrics.total_hours - 60.0).abs() < 1e-6);

    // Decay rewards recency over raw volume
    assert!(close.metrics.effective_hours > faded.metrics.effective_hours);
    assert!(close.metrics.retention_rate > faded.metrics.retention_rate);
    assert!(close.strength.strength > faded.strength.strength);

    // Only the close friend has 30-day activity
    assert!(close.recent_intimacy() > 0.0);
    assert_eq!(faded.recent_intimacy(), 0.0);
    assert!(close.life_share() > 0.0);

    for row in &analysis.results {
        assert!(row.strength.strength >= 0.0 && row.strength.strength <= 100.0);
        for window in &row.recency {
            assert!(window.intimacy >= 0.0 && window.intimacy <= 100.0);
        }
    }
}

#[test]
fn hidden_relationship_flagged_in_gexf() {
    let fixture = Fixture::new();
    let end = reference();

    // Cohort of linked friends with modest activity
    for i in 0..5 {
        let id = format!("usr_{i}");
        fixture.add_friend(&id, &format!("Friend {i}"));
        fixture.add_link(&id, "usr_0");
        for j in 0..4 {
            fixture.add_departure(&id, end - Duration::days(j * 7), 1_800_000);
        }
    }
    // Heavy interaction, zero declared mutual connections
    fixture.add_friend("usr_covert", "Covert");
    for i in 0..40 {
        fixture.add_departure("usr_covert", end - Duration::days(i), 7_200_000);
    }

    let reader = SqliteLogReader::open(&fixture.path, None).expect("open reader");
    let analysis = analyze(&reader, &fixed_params()).expect("analysis");

    let covert = analysis
        .results
        .iter()
        .find(|r| r.contact.user_id == "usr_covert")
        .expect("covert row");
    assert!(covert.strength.is_hidden);

    let document = gexf::to_gexf(&analysis);
    assert!(document.contains("<node id=\"usr_covert\""));
    assert!(document.contains("<attvalue for=\"15\" value=\"true\"/>"));

    let text = report::ranking_report(&analysis, 10);
    assert!(text.contains("Hidden relationships"));
    assert!(text.contains("Covert"));
}

#[test]
fn empty_log_yields_zero_scores() {
    let fixture = Fixture::new();
    fixture.add_friend("usr_quiet", "Quiet");

    let reader = SqliteLogReader::open(&fixture.path, None).expect("open reader");
    let analysis = analyze(&reader, &ScoringParams::default()).expect("analysis");

    assert_eq!(analysis.results.len(), 1);
    assert_eq!(analysis.results[0].strength.strength, 0.0);
    assert_eq!(analysis.results[0].recent_intimacy(), 0.0);

    let csv = report::strength_ranking_csv(&analysis);
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn ambiguous_prefix_is_an_error() {
    let fixture = Fixture::new();
    fixture
        .conn()
        .execute_batch(
            "CREATE TABLE usrother_friend_log_current (user_id TEXT, display_name TEXT);",
        )
        .expect("second dataset");

    let result = SqliteLogReader::open(&fixture.path, None);
    assert!(matches!(result, Err(AnalysisError::AmbiguousPrefix(_))));

    // An explicit prefix resolves the ambiguity, even as a full table name
    let reader = SqliteLogReader::open(
        &fixture.path,
        Some(&format!("{PREFIX}_friend_log_current")),
    )
    .expect("explicit prefix");
    assert_eq!(reader.prefix(), PREFIX);
}

#[test]
fn contact_table_without_trust_column() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("old.sqlite3");
    let conn = Connection::open(&path).expect("open db");
    conn.execute_batch(&format!(
        "CREATE TABLE {PREFIX}_friend_log_current (user_id TEXT, display_name TEXT);
         CREATE TABLE {PREFIX}_mutual_graph_links (friend_id TEXT, mutual_id TEXT);
         CREATE TABLE gamelog_join_leave (
             id INTEGER PRIMARY KEY, created_at TEXT, type TEXT,
             user_id TEXT, time INTEGER, location TEXT
         );
         CREATE TABLE gamelog_location (id INTEGER PRIMARY KEY, created_at TEXT, time INTEGER);
         INSERT INTO {PREFIX}_friend_log_current VALUES ('usr_a', 'Old Friend');",
    ))
    .expect("schema");
    drop(conn);

    let reader = SqliteLogReader::open(&path, None).expect("open reader");
    let contacts = reader.contacts().expect("contacts");
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].trust_level, "");
}
