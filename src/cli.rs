use crate::api::{HttpServerApi, ServerApi};
use crate::logging::{self, LogTarget};
use crate::model::{ClientConfig, Envelope, ServerList, StatusFilter};
use crate::report::{self, ReportFormat, TableSnapshot};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "server-status-cli",
    version,
    about = "Server status dashboard for a server manager API"
)]
pub struct Cli {
    /// Base URL of the server manager API
    #[arg(long, default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Per-request timeout
    #[arg(long, default_value = "10s")]
    pub timeout: humantime::Duration,

    /// Print the server list as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print the server list as a text table and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Status filter applied in text/JSON mode and on TUI launch
    #[arg(long, value_enum, default_value_t = StatusFilter::All)]
    pub filter: StatusFilter,

    /// Write a report of the listed servers to this path (text/JSON mode)
    #[arg(long)]
    pub export: Option<std::path::PathBuf>,

    /// Report format used by --export and as the TUI default
    #[arg(long, value_enum, default_value_t = ReportFormat::Xls)]
    pub export_format: ReportFormat,

    /// Directory the TUI saves reports to (defaults to the downloads folder)
    #[arg(long)]
    pub report_dir: Option<std::path::PathBuf>,

    /// Log file used in TUI mode (defaults to the platform data directory)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }
    if args.export.is_some() && !args.json && !args.text {
        return Err(anyhow::anyhow!(
            "--export is only used with --json or --text; press 'x' in the TUI instead"
        ));
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            logging::init_tracing(LogTarget::File(args.log_file.as_deref()), args.verbose)?;
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            logging::init_tracing(LogTarget::Stderr, args.verbose)?;
            return run_text(args).await;
        }
    }

    logging::init_tracing(LogTarget::Stderr, args.verbose)?;
    if args.json {
        return run_json(args).await;
    }
    run_text(args).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.trim_end_matches('/').to_string(),
        request_timeout: Duration::from(args.timeout),
        user_agent: format!("server-status-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

async fn fetch(args: &Cli) -> Result<Envelope<ServerList>> {
    let api = HttpServerApi::new(&build_config(args))?;
    crate::orchestrator::load_once(&api as &dyn ServerApi, args.filter)
        .await
        .context("failed to load servers")
}

async fn run_json(args: Cli) -> Result<()> {
    let env = fetch(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();

    handle_export(&args, &env, &out_tx)?;
    let out = serde_json::to_string_pretty(&env)?;
    let _ = out_tx.send(OutputLine::Stdout(out));

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let env = fetch(&args).await?;
    let (out_tx, out_handle) = spawn_output_writer();

    let summary = crate::text_summary::build_text_summary(&env);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    handle_export(&args, &env, &out_tx)?;

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// Write the report requested with --export, if any.
fn handle_export(
    args: &Cli,
    env: &Envelope<ServerList>,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    if let Some(p) = args.export.as_deref() {
        let table = TableSnapshot::from_servers(&env.data.servers);
        let blob = report::build_report(&table, args.export_format)?;
        report::save_blob_as(&blob, p)?;
        let _ = out_tx.send(OutputLine::Stderr(format!(
            "Exported {} ({}): {}",
            blob.file_name,
            blob.mime,
            p.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_backend() {
        let args = Cli::try_parse_from(["server-status-cli"]).unwrap();
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert!(cfg.user_agent.starts_with("server-status-cli/"));
        assert_eq!(args.filter, StatusFilter::All);
        assert_eq!(args.export_format, ReportFormat::Xls);
    }

    #[test]
    fn parses_filter_and_export_flags() {
        let args = Cli::try_parse_from([
            "server-status-cli",
            "--base-url",
            "http://10.0.0.2:9000/",
            "--timeout",
            "1500ms",
            "--text",
            "--filter",
            "down",
            "--export",
            "out.csv",
            "--export-format",
            "csv",
        ])
        .unwrap();
        let cfg = build_config(&args);
        assert_eq!(cfg.base_url, "http://10.0.0.2:9000");
        assert_eq!(cfg.request_timeout, Duration::from_millis(1500));
        assert_eq!(args.filter, StatusFilter::Down);
        assert_eq!(args.export_format, ReportFormat::Csv);
        assert!(args.text);
    }

    #[test]
    fn rejects_unknown_filter() {
        assert!(Cli::try_parse_from(["server-status-cli", "--filter", "sideways"]).is_err());
    }

    #[tokio::test]
    async fn export_requires_output_mode() {
        let args = Cli::try_parse_from(["server-status-cli", "--export", "r.xls"]).unwrap();
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("--export"));
    }
}
