use crate::report::{self, ReportFormat, TableSnapshot};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Clipboard worker channel, started on first copy
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Export the rows currently on screen and return the written path.
pub fn export_report(state: &UiState, format: ReportFormat) -> Result<PathBuf> {
    let table = TableSnapshot::from_servers(state.rows());
    let blob = report::build_report(&table, format).context("build report")?;
    report::save_blob(&blob, &state.report_dir)
}

/// Export and update the status line with the outcome.
pub fn export_and_show_path(state: &mut UiState, format: ReportFormat) {
    match export_report(state, format) {
        Ok(path) => {
            let path_str = path.to_string_lossy().to_string();
            state.set_info(format!(
                "Exported report: {} (press 'y' to copy path)",
                path.display()
            ));
            state.last_exported_path = Some(path_str);
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "report export failed");
            state.set_error(format!("Export failed: {e:#}"));
        }
    }
}

/// Start the clipboard worker if needed.
/// Each copy keeps its clipboard handle alive for a moment so clipboard
/// managers on Linux can read the contents before it is dropped.
fn clipboard_sender() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in rx {
                if let Ok(mut clipboard) = arboard::Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });
        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue `text` for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    clipboard_sender()?
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))
}
