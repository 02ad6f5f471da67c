//! GEXF graph export
//!
//! Serializes the scored contact table into a static undirected GEXF 1.3
//! graph: one node per declared contact with the full metric and score
//! attribute set, one edge per declared mutual-connection pair. Node order
//! follows the user id so a frozen dataset always produces identical output.

use crate::pipeline::Analysis;

/// Build the GEXF document for an analysis run
pub fn to_gexf(analysis: &Analysis) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<gexf xmlns=\"http://www.gexf.net/1.3draft\" version=\"1.3\">\n");

    // Stamp the meta block from the reference instant, never wall-clock time
    match analysis.reference_time {
        Some(reference) => out.push_str(&format!(
            "  <meta lastmodifieddate=\"{}\">\n",
            reference.format("%Y-%m-%d")
        )),
        None => out.push_str("  <meta>\n"),
    }
    out.push_str("    <creator>affinity-graph</creator>\n");
    out.push_str("    <description>Contact graph scored from co-presence sessions</description>\n");
    out.push_str("  </meta>\n");
    out.push_str("  <graph mode=\"static\" defaultedgetype=\"undirected\">\n");

    out.push_str("    <attributes class=\"node\" mode=\"static\">\n");
    for (id, title, kind) in ATTRIBUTES {
        out.push_str(&format!(
            "      <attribute id=\"{id}\" title=\"{title}\" type=\"{kind}\"/>\n"
        ));
    }
    out.push_str("    </attributes>\n");

    out.push_str("    <nodes>\n");
    for row in &analysis.results {
        let metrics = &row.metrics;
        let recent = row.recency.first().copied().unwrap_or_default();

        out.push_str(&format!(
            "      <node id=\"{}\" label=\"{}\">\n",
            escape_xml(&row.contact.user_id),
            escape_xml(row.contact.label()),
        ));
        out.push_str("        <attvalues>\n");
        push_attr(&mut out, 0, &escape_xml(row.contact.kind.as_str()));
        push_attr(&mut out, 1, &escape_xml(&row.contact.display_name));
        push_attr(&mut out, 2, &escape_xml(&row.contact.trust_level));
        push_attr(&mut out, 3, &metrics.meet_count.to_string());
        push_attr(&mut out, 4, &metrics.meets_7d.to_string());
        push_attr(&mut out, 5, &metrics.meets_30d.to_string());
        push_attr(&mut out, 6, &format!("{:.2}", metrics.total_hours * 3600.0));
        push_attr(&mut out, 7, &format!("{:.2}", metrics.hours_7d * 3600.0));
        push_attr(&mut out, 8, &format!("{:.2}", metrics.hours_30d * 3600.0));
        push_attr(&mut out, 9, &metrics.days_known.to_string());
        push_attr(&mut out, 10, &format!("{:.2}", row.strength.strength));
        push_attr(&mut out, 11, &format!("{:.2}", recent.intimacy));
        push_attr(&mut out, 12, &format!("{:.2}", metrics.effective_hours));
        push_attr(&mut out, 13, &format!("{:.4}", metrics.retention_rate));
        push_attr(&mut out, 14, &format!("{:.4}", recent.life_share));
        push_attr(&mut out, 15, if row.strength.is_hidden { "true" } else { "false" });
        push_attr(&mut out, 16, &format!("{:.2}", row.intimacy_for(30).unwrap_or(0.0)));
        push_attr(&mut out, 17, &format!("{:.2}", row.intimacy_for(60).unwrap_or(0.0)));
        push_attr(&mut out, 18, &format!("{:.2}", row.intimacy_for(90).unwrap_or(0.0)));
        out.push_str("        </attvalues>\n");
        out.push_str("      </node>\n");
    }
    out.push_str("    </nodes>\n");

    out.push_str("    <edges>\n");
    for (idx, (source, target)) in analysis.edges.iter().enumerate() {
        out.push_str(&format!(
            "      <edge id=\"{idx}\" source=\"{}\" target=\"{}\"/>\n",
            escape_xml(source),
            escape_xml(target),
        ));
    }
    out.push_str("    </edges>\n");
    out.push_str("  </graph>\n");
    out.push_str("</gexf>\n");
    out
}

const ATTRIBUTES: &[(u32, &str, &str)] = &[
    (0, "type", "string"),
    (1, "displayName", "string"),
    (2, "trustLevel", "string"),
    (3, "meetCount", "integer"),
    (4, "meetCount7d", "integer"),
    (5, "meetCount30d", "integer"),
    (6, "playTime", "float"),
    (7, "playTime7d", "float"),
    (8, "playTime30d", "float"),
    (9, "daysKnown", "integer"),
    (10, "relationshipStrength", "float"),
    (11, "recentIntimacy", "float"),
    (12, "effectiveHours", "float"),
    (13, "retentionRate", "float"),
    (14, "lifeShare", "float"),
    (15, "isHiddenFriend", "boolean"),
    (16, "recentIntimacy30d", "float"),
    (17, "recentIntimacy60d", "float"),
    (18, "recentIntimacy90d", "float"),
];

fn push_attr(out: &mut String, id: u32, value: &str) {
    out.push_str(&format!(
        "          <attvalue for=\"{id}\" value=\"{value}\"/>\n"
    ));
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
