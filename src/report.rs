//! Ranking report and CSV export
//!
//! Renders the flat result table of an [`Analysis`](crate::pipeline::Analysis)
//! as a plain-text report (strength ranking, recency ranking, hidden
//! relationships, retention extremes), as CSV ranking files, and as JSON.

use crate::error::AnalysisError;
use crate::pipeline::Analysis;
use crate::types::ScoreResult;

/// Contacts below this total are ignored in the fading-relationship list
const LOW_RETENTION_MIN_HOURS: f64 = 30.0;
/// Contacts below this total are ignored in the fresh-relationship list
const HIGH_RETENTION_MIN_HOURS: f64 = 20.0;
/// Rows shown in each retention extreme list
const RETENTION_LIST_LEN: usize = 8;

fn by_strength(analysis: &Analysis) -> Vec<&ScoreResult> {
    let mut rows: Vec<&ScoreResult> = analysis.results.iter().collect();
    rows.sort_by(|a, b| b.strength.strength.total_cmp(&a.strength.strength));
    rows
}

fn by_intimacy(analysis: &Analysis) -> Vec<&ScoreResult> {
    let mut rows: Vec<&ScoreResult> = analysis.results.iter().collect();
    rows.sort_by(|a, b| b.recent_intimacy().total_cmp(&a.recent_intimacy()));
    rows
}

/// Render the plain-text ranking report
pub fn ranking_report(analysis: &Analysis, top: usize) -> String {
    let mut out = String::new();
    let rule = "=".repeat(70);

    out.push_str(&rule);
    out.push_str("\nRelationship Analysis Report\n");
    out.push_str(&rule);
    out.push('\n');

    out.push_str(&format!(
        "\nLog span: {} days\nContacts: {}\n",
        analysis.params.total_log_days,
        analysis.results.len()
    ));
    out.push_str(&format!(
        "Half-life: {:.0} days{} | Recent window: {} days{}\n",
        analysis.params.half_life_days,
        if analysis.params.half_life_auto {
            " (auto)"
        } else {
            ""
        },
        analysis.params.primary_window(),
        if analysis.params.window_auto {
            " (auto)"
        } else {
            ""
        },
    ));
    if let Some(reference) = analysis.reference_time {
        out.push_str(&format!(
            "Reference instant: {}\n",
            reference.format("%Y-%m-%d %H:%M")
        ));
    }

    // Strength ranking
    out.push_str(&format!("\n{rule}\n"));
    out.push_str("Relationship strength ranking (decayed effective hours)\n");
    out.push_str(&rule);
    out.push_str(&format!(
        "\n\n{:<4} {:<24} {:>8} {:>10} {:>8} {:>8}  {}\n",
        "#", "contact", "total", "effective", "kept", "strength", "flags"
    ));
    out.push_str(&"-".repeat(75));
    out.push('\n');

    for (rank, row) in by_strength(analysis).iter().take(top).enumerate() {
        let mark = if row.strength.is_hidden { "hidden" } else { "" };
        out.push_str(&format!(
            "{:<4} {:<24} {:>7.1}h {:>9.1}h {:>7.1}% {:>8.1}  {}\n",
            rank + 1,
            clip(row.contact.label(), 24),
            row.metrics.total_hours,
            row.metrics.effective_hours,
            row.metrics.retention_rate * 100.0,
            row.strength.strength,
            mark,
        ));
    }

    // Recency ranking over the primary window
    out.push_str(&format!("\n{rule}\n"));
    out.push_str(&format!(
        "Recent intimacy ranking (last {} days)\n",
        analysis.params.primary_window()
    ));
    out.push_str(&rule);
    out.push_str(&format!(
        "\n\n{:<4} {:<24} {:>8} {:>6} {:>10} {:>9}\n",
        "#", "contact", "recent", "meets", "life share", "intimacy"
    ));
    out.push_str(&"-".repeat(70));
    out.push('\n');

    for (rank, row) in by_intimacy(analysis).iter().take(top).enumerate() {
        let recent = row.recency.first().copied().unwrap_or_default();
        out.push_str(&format!(
            "{:<4} {:<24} {:>7.1}h {:>6} {:>9.2}% {:>9.1}\n",
            rank + 1,
            clip(row.contact.label(), 24),
            recent.recent_hours,
            recent.recent_meets,
            recent.life_share * 100.0,
            recent.intimacy,
        ));
    }

    // Hidden relationships
    let mut hidden: Vec<&ScoreResult> = analysis.hidden().collect();
    if !hidden.is_empty() {
        hidden.sort_by(|a, b| b.metrics.total_hours.total_cmp(&a.metrics.total_hours));
        out.push_str("\nHidden relationships (no declared mutual connections, high interaction):\n");
        for row in hidden {
            out.push_str(&format!(
                "   - {}: {:.1}h total, {} meets\n",
                row.contact.label(),
                row.metrics.total_hours,
                row.metrics.meet_count,
            ));
        }
    }

    // Retention extremes
    out.push_str(&format!("\n{rule}\n"));
    out.push_str("Retention: how much history survives decay\n");
    out.push_str(&rule);
    out.push('\n');

    let mut fading: Vec<&ScoreResult> = analysis
        .results
        .iter()
        .filter(|r| r.metrics.total_hours > LOW_RETENTION_MIN_HOURS)
        .collect();
    fading.sort_by(|a, b| a.metrics.retention_rate.total_cmp(&b.metrics.retention_rate));
    if !fading.is_empty() {
        out.push_str("\nLowest retention (fading):\n");
        for row in fading.iter().take(RETENTION_LIST_LEN) {
            out.push_str(&retention_line(row));
        }
    }

    let mut fresh: Vec<&ScoreResult> = analysis
        .results
        .iter()
        .filter(|r| r.metrics.total_hours > HIGH_RETENTION_MIN_HOURS)
        .collect();
    fresh.sort_by(|a, b| b.metrics.retention_rate.total_cmp(&a.metrics.retention_rate));
    if !fresh.is_empty() {
        out.push_str("\nHighest retention (fresh):\n");
        for row in fresh.iter().take(RETENTION_LIST_LEN) {
            out.push_str(&retention_line(row));
        }
    }

    out
}

fn retention_line(row: &ScoreResult) -> String {
    format!(
        "   - {}: {:.0}h total -> {:.1}h effective ({:.1}% kept)\n",
        row.contact.label(),
        row.metrics.total_hours,
        row.metrics.effective_hours,
        row.metrics.retention_rate * 100.0,
    )
}

fn clip(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        value.chars().take(max_chars.saturating_sub(1)).collect::<String>() + "…"
    }
}

const CSV_HEADER: &str = "rank,name,user_id,total_hours,effective_hours,retention_rate,\
meet_count,interaction_count,active_days,connections,recent_hours,recent_meets,\
relationship_strength,recent_intimacy";

/// CSV ranking by relationship strength
pub fn strength_ranking_csv(analysis: &Analysis) -> String {
    csv_rows(by_strength(analysis))
}

/// CSV ranking by recent intimacy over the primary window
pub fn intimacy_ranking_csv(analysis: &Analysis) -> String {
    csv_rows(by_intimacy(analysis))
}

fn csv_rows(rows: Vec<&ScoreResult>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for (rank, row) in rows.iter().enumerate() {
        let recent = row.recency.first().copied().unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{:.2},{:.2},{:.4},{},{},{},{},{:.2},{},{:.2},{:.2}\n",
            rank + 1,
            escape_csv(row.contact.label()),
            escape_csv(&row.contact.user_id),
            row.metrics.total_hours,
            row.metrics.effective_hours,
            row.metrics.retention_rate,
            row.metrics.meet_count,
            row.metrics.interaction_count,
            row.metrics.active_days,
            row.metrics.mutual_connections,
            recent.recent_hours,
            recent.recent_meets,
            row.strength.strength,
            recent.intimacy,
        ));
    }
    out
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serialize the full result table as pretty JSON
pub fn results_json(analysis: &Analysis) -> Result<String, AnalysisError> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{HalfLife, RecentWindow, ScoringParams};
    use crate::types::{
        Contact, ContactKind, ContactMetrics, RecencyScore, StrengthScore,
    };

    fn result(name: &str, strength: f64, intimacy: f64, total_hours: f64) -> ScoreResult {
        ScoreResult {
            contact: Contact {
                user_id: format!("usr_{name}"),
                display_name: name.to_string(),
                trust_level: String::new(),
                kind: ContactKind::Friend,
            },
            metrics: ContactMetrics {
                user_id: format!("usr_{name}"),
                total_hours,
                effective_hours: total_hours * 0.5,
                retention_rate: if total_hours > 0.0 { 0.5 } else { 0.0 },
                interaction_count: 4,
                meet_count: 5,
                active_days: 3,
                days_known: 40,
                mutual_connections: 2,
                hours_7d: 0.0,
                meets_7d: 0,
                hours_30d: 1.0,
                meets_30d: 1,
                recent: Vec::new(),
            },
            strength: StrengthScore {
                strength,
                ..StrengthScore::default()
            },
            recency: vec![RecencyScore {
                window_days: 30,
                recent_hours: 1.0,
                recent_meets: 1,
                intimacy,
                ..RecencyScore::default()
            }],
        }
    }

    fn analysis(results: Vec<ScoreResult>) -> Analysis {
        let params = ScoringParams {
            half_life: HalfLife::Days(120.0),
            recent_window: RecentWindow::Days(30),
            extra_windows: Vec::new(),
        };
        Analysis {
            results,
            edges: Vec::new(),
            params: params.resolve(0, 100).unwrap(),
            reference_time: None,
            observer_hours: vec![(30, 0.0)],
        }
    }

    #[test]
    fn test_report_orders_by_strength() {
        let analysis = analysis(vec![
            result("low", 10.0, 50.0, 40.0),
            result("high", 90.0, 5.0, 40.0),
        ]);
        let report = ranking_report(&analysis, 10);

        let high_pos = report.find("1    high").unwrap();
        let low_pos = report.find("2    low").unwrap();
        assert!(high_pos < low_pos);
    }

    #[test]
    fn test_csv_shape_and_order() {
        let analysis = analysis(vec![
            result("b", 20.0, 80.0, 10.0),
            result("a", 70.0, 10.0, 10.0),
        ]);

        let strength = strength_ranking_csv(&analysis);
        let mut lines = strength.lines();
        assert!(lines.next().unwrap().starts_with("rank,name,user_id"));
        assert!(lines.next().unwrap().starts_with("1,a,"));
        assert!(lines.next().unwrap().starts_with("2,b,"));

        let intimacy = intimacy_ranking_csv(&analysis);
        assert!(intimacy.lines().nth(1).unwrap().starts_with("1,b,"));
    }

    #[test]
    fn test_csv_escapes_labels() {
        let mut row = result("x", 10.0, 10.0, 5.0);
        row.contact.display_name = "Last, First \"nick\"".to_string();
        let analysis = analysis(vec![row]);

        let csv = strength_ranking_csv(&analysis);
        assert!(csv.contains("\"Last, First \"\"nick\"\"\""));
    }

    #[test]
    fn test_empty_results_render() {
        let analysis = analysis(Vec::new());
        let report = ranking_report(&analysis, 10);
        assert!(report.contains("Contacts: 0"));

        let csv = strength_ranking_csv(&analysis);
        assert_eq!(csv.lines().count(), 1);
    }
}
