//! Affinity CLI - score a co-presence session log and export the results
//!
//! Reads the source database, runs the scoring pipeline, prints the ranking
//! report, and optionally writes CSV rankings, a JSON dump, and a GEXF graph.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use affinity_graph::{analyze, gexf, report, HalfLife, RecentWindow, ScoringParams};
use affinity_graph::SqliteLogReader;

/// Score contacts from a co-presence session log
#[derive(Parser)]
#[command(name = "affinity")]
#[command(version = affinity_graph::VERSION)]
#[command(about = "Relationship strength and recent intimacy from co-presence logs", long_about = None)]
struct Cli {
    /// Path to the source SQLite database
    #[arg(long, default_value = "VRCX.sqlite3")]
    db: PathBuf,

    /// Use the default Windows database location (%APPDATA%\VRCX\VRCX.sqlite3)
    #[arg(long)]
    win: bool,

    /// Table prefix; auto-detected when omitted
    #[arg(long)]
    prefix: Option<String>,

    /// Decay half-life in days, or "auto" to adapt to your activity
    #[arg(long, default_value = "auto")]
    halflife: String,

    /// Recent window in days, or "auto"
    #[arg(long, default_value = "auto")]
    recent: String,

    /// Rows to show in each ranking
    #[arg(long, short = 'n', default_value = "25")]
    top: usize,

    /// Write the ranking report to a file instead of stdout only
    #[arg(long, short = 'o')]
    report: Option<PathBuf>,

    /// Write the two ranking CSV files, with an optional filename prefix
    #[arg(long, short = 'r', num_args = 0..=1, default_missing_value = "")]
    rankings: Option<String>,

    /// Write the scored mutual-connection graph as GEXF
    #[arg(long)]
    gexf: Option<PathBuf>,

    /// Write the full result table as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db_path = resolve_db_path(&cli)?;
    info!("database: {}", db_path.display());

    let params = ScoringParams {
        half_life: HalfLife::parse(&cli.halflife)?,
        recent_window: RecentWindow::parse(&cli.recent)?,
        ..ScoringParams::default()
    };

    let reader = SqliteLogReader::open(&db_path, cli.prefix.as_deref())
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let analysis = analyze(&reader, &params)?;

    let text = report::ranking_report(&analysis, cli.top);
    println!("{text}");

    if let Some(path) = &cli.report {
        fs::write(path, &text)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("report written to {}", path.display());
    }

    if let Some(prefix) = &cli.rankings {
        let prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}_")
        };

        let strength_path = format!("{prefix}relationship_strength_ranking.csv");
        fs::write(&strength_path, report::strength_ranking_csv(&analysis))
            .with_context(|| format!("failed to write {strength_path}"))?;
        eprintln!("strength ranking written to {strength_path}");

        let intimacy_path = format!("{prefix}recent_intimacy_ranking.csv");
        fs::write(&intimacy_path, report::intimacy_ranking_csv(&analysis))
            .with_context(|| format!("failed to write {intimacy_path}"))?;
        eprintln!("intimacy ranking written to {intimacy_path}");
    }

    if let Some(path) = &cli.gexf {
        fs::write(path, gexf::to_gexf(&analysis))
            .with_context(|| format!("failed to write GEXF to {}", path.display()))?;
        let hidden = analysis.hidden().count();
        eprintln!(
            "exported {} contacts and {} edges to {}",
            analysis.results.len(),
            analysis.edges.len(),
            path.display()
        );
        if hidden > 0 {
            eprintln!("detected {hidden} potential hidden relationships");
        }
    }

    if let Some(path) = &cli.json {
        fs::write(path, report::results_json(&analysis)?)
            .with_context(|| format!("failed to write JSON to {}", path.display()))?;
        eprintln!("results written to {}", path.display());
    }

    Ok(())
}

fn resolve_db_path(cli: &Cli) -> Result<PathBuf> {
    if cli.win {
        let appdata = std::env::var("APPDATA").context("APPDATA is not set")?;
        let path = PathBuf::from(appdata).join("VRCX").join("VRCX.sqlite3");
        if !path.exists() {
            bail!("default Windows database not found: {}", path.display());
        }
        return Ok(path);
    }
    Ok(cli.db.clone())
}
