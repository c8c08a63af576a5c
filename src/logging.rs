//! Tracing setup.
//!
//! Interactive mode logs to a file so output never lands on the alternate
//! screen; text/JSON modes log to stderr.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

pub(crate) enum LogTarget<'a> {
    Stderr,
    File(Option<&'a Path>),
}

/// Default log directory under the platform data dir.
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("server-status-cli")
}

pub(crate) fn init_tracing(target: LogTarget<'_>, verbose: bool) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(if verbose { "debug" } else { "info" })
            .context("build log filter")?,
    };

    let (console_layer, file_layer) = match target {
        LogTarget::Stderr => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            ),
            None,
        ),
        LogTarget::File(path) => {
            let (dir, file_name) = match path {
                Some(p) => (
                    p.parent()
                        .filter(|d| !d.as_os_str().is_empty())
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| PathBuf::from(".")),
                    p.file_name()
                        .map(|n| n.to_os_string())
                        .unwrap_or_else(|| "server-status-cli.log".into()),
                ),
                None => (default_log_dir(), "server-status-cli.log".into()),
            };
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);
            (
                None,
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                ),
            )
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}
