//! Logging configuration using tracing

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Result, ResultExt};

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/dcnview/logs/` so they never fight the
/// TUI for the terminal. Log level is controlled by the `DCNVIEW_LOG`
/// environment variable.
///
/// # Examples
/// ```bash
/// DCNVIEW_LOG=debug dcnview
/// DCNVIEW_LOG=dcnview_app::bridge=trace dcnview
/// ```
pub fn init(version: &str) -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)
        .context("Failed to create log directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "dcnview.log");

    // Default to info, allow override via DCNVIEW_LOG
    let env_filter = EnvFilter::try_from_env("DCNVIEW_LOG").unwrap_or_else(|_| {
        EnvFilter::new("warn,dcnview=info,dcnview_app=info,dcnview_transport=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("dcnview {} starting", version);
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("dcnview").join("logs"))
}
