use std::fmt::Write;

use super::domain::{Status, TrackerDocument, TrackerRow};

const TABLE_HEADER: &str = "| Endpoint | Screen | Status | Owner | Blockers |";
const TABLE_SEPARATOR: &str = "|---|---|---|---|---|";

/// Renders the canonical markdown form. Parsing the output yields an equal document.
pub fn render_markdown(document: &TrackerDocument) -> String {
    let mut out = String::new();

    if !document.title.is_empty() {
        let _ = writeln!(out, "# {}\n", document.title);
    }

    if !document.preamble.is_empty() {
        for line in &document.preamble {
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }

    if let Some(updated_on) = document.updated_on {
        let _ = writeln!(out, "_Last updated: {}_\n", updated_on.format("%Y-%m-%d"));
    }

    let legend = Status::legend()
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "Status legend: {legend}");

    for section in &document.sections {
        let _ = writeln!(out, "\n## {}\n", section.name);

        if !section.notes.is_empty() {
            for line in &section.notes {
                let _ = writeln!(out, "{line}");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "{TABLE_HEADER}");
        let _ = writeln!(out, "{TABLE_SEPARATOR}");
        for row in &section.rows {
            let _ = writeln!(out, "{}", render_row(row));
        }
    }

    out
}

fn render_row(row: &TrackerRow) -> String {
    format!(
        "| `{}` | {} | {} | {} | {} |",
        row.endpoint,
        escape(&row.screen),
        row.status.label(),
        row.owner.as_deref().map(escape).unwrap_or_default(),
        row.blockers.as_deref().map(escape).unwrap_or_default(),
    )
}

fn escape(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
