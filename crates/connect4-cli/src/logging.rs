//! Logging setup.
//!
//! Two sinks share one `EnvFilter` (default `info`, overridable with
//! `RUST_LOG`): the console on stderr and an append-only text file created
//! per run under the log directory, named after the start time.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the log file of a run started at `started`.
pub fn log_file_name(started: DateTime<Local>) -> String {
    format!("{}.txt", started.format("%d-%m-%Y_%H-%M-%S"))
}

/// Install the global subscriber.
///
/// Returns the path of the log file of this run.
pub fn init(log_dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    let path = log_dir.join(log_file_name(Local::now()));
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_log_file_name() {
        let started = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(log_file_name(started), "07-03-2024_09-05-01.txt");
    }
}
