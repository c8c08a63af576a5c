//! Spreadsheet report export.
//!
//! Turns a snapshot of the rendered server table into a downloadable blob.
//! The default format is an HTML table tagged with the Excel MIME type, which
//! spreadsheet applications open directly; CSV is also available.

use crate::model::ServerRecord;
use anyhow::{Context, Result};
use bytes::Bytes;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const XLS_MIME: &str = "application/vnd.ms-excel.sheet.macroEnabled.12";
pub const CSV_MIME: &str = "text/csv";
const REPORT_STEM: &str = "server-report";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Xls,
    Csv,
}

/// Tabular snapshot of what the dashboard currently shows.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    pub generated_at: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSnapshot {
    pub fn from_servers(servers: &[ServerRecord]) -> Self {
        let headers = ["ID", "IP Address", "Name", "Memory", "Type", "Status"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = servers
            .iter()
            .map(|s| {
                vec![
                    s.id.map(|id| id.to_string()).unwrap_or_default(),
                    s.ip_address.clone(),
                    s.name.clone(),
                    s.memory.clone(),
                    s.server_type.clone(),
                    s.status.label().to_string(),
                ]
            })
            .collect();
        Self {
            generated_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            headers,
            rows,
        }
    }
}

/// Serialized report ready to hand to a file-save mechanism.
#[derive(Debug, Clone)]
pub struct ReportBlob {
    pub mime: &'static str,
    pub file_name: String,
    pub bytes: Bytes,
}

pub fn build_report(table: &TableSnapshot, format: ReportFormat) -> Result<ReportBlob> {
    match format {
        ReportFormat::Xls => Ok(ReportBlob {
            mime: XLS_MIME,
            file_name: format!("{REPORT_STEM}.xls"),
            bytes: Bytes::from(render_html_table(table)),
        }),
        ReportFormat::Csv => Ok(ReportBlob {
            mime: CSV_MIME,
            file_name: format!("{REPORT_STEM}.csv"),
            bytes: Bytes::from(render_csv(table)?),
        }),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_html_table(table: &TableSnapshot) -> String {
    let mut html = String::new();
    html.push_str("<html><head><meta charset=\"utf-8\"></head><body>\n");
    html.push_str("<table id=\"servers\">\n");
    let _ = writeln!(
        html,
        "<caption>Server report {}</caption>",
        escape_html(&table.generated_at)
    );
    html.push_str("<thead><tr>");
    for h in &table.headers {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body></html>\n");
    html
}

fn render_csv(table: &TableSnapshot) -> Result<Vec<u8>> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(&table.headers).context("write csv header")?;
    for row in &table.rows {
        w.write_record(row).context("write csv row")?;
    }
    w.into_inner().context("flush csv report")
}

/// Directory reports are saved to when no path is given.
pub fn default_report_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write `blob` into `dir` under its own file name. Returns the written path.
pub fn save_blob(blob: &ReportBlob, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create report directory {}", dir.display()))?;
    let path = dir.join(&blob.file_name);
    std::fs::write(&path, &blob.bytes)
        .with_context(|| format!("write report {}", path.display()))?;
    Ok(path)
}

/// Write `blob` to an explicit file path.
pub fn save_blob_as(blob: &ReportBlob, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report directory {}", parent.display()))?;
    }
    std::fs::write(path, &blob.bytes).with_context(|| format!("write report {}", path.display()))
}
