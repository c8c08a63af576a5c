//! Text summary builder for CLI output.
//!
//! Formats the server list as an aligned, human-readable table for text mode.

use crate::model::{Envelope, ServerList, ServerStatus};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

const HEADERS: [&str; 6] = ["ID", "IP ADDRESS", "NAME", "MEMORY", "TYPE", "STATUS"];

/// Build a text table from a loaded envelope.
pub(crate) fn build_text_summary(env: &Envelope<ServerList>) -> TextSummary {
    let rows: Vec<[String; 6]> = env
        .data
        .servers
        .iter()
        .map(|s| {
            [
                s.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                s.ip_address.clone(),
                s.name.clone(),
                s.memory.clone(),
                s.server_type.clone(),
                s.status.label().to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let fmt_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 3);
    if !env.message.is_empty() {
        lines.push(env.message.clone());
    }
    lines.push(fmt_row(&HEADERS.map(String::from)));
    for row in &rows {
        lines.push(fmt_row(row));
    }

    let up = env
        .data
        .servers
        .iter()
        .filter(|s| s.status == ServerStatus::Up)
        .count();
    lines.push(format!(
        "{} server(s): {} up, {} down",
        rows.len(),
        up,
        rows.len() - up
    ));

    TextSummary { lines }
}
