//! Structured logging through `tracing`. The terminal belongs to the TUI, so
//! every event goes to a log file instead of stdout or stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable carrying a full filter directive, e.g.
/// `personal_library_manager=debug`. It overrides the `--log-level` flag.
pub const LOG_ENV: &str = "LIBRARY_LOG";

/// Install the global subscriber, appending to `log_file`.
pub fn init_logging(level: &str, log_file: &Path) -> Result<()> {
    let filter = build_env_filter(level)?;

    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file),
        )
        .try_init()
        .context("failed to install log subscriber")
}

fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(directive) = std::env::var(LOG_ENV) {
        if !directive.trim().is_empty() {
            return EnvFilter::try_new(&directive)
                .with_context(|| format!("invalid {LOG_ENV} directive: {directive}"));
        }
    }
    EnvFilter::try_new(level).with_context(|| format!("invalid log level: {level}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_level() {
        if std::env::var(LOG_ENV).is_ok() {
            return;
        }
        assert!(build_env_filter("info").is_ok());
        assert!(build_env_filter("personal_library_manager=bogus").is_err());
    }
}
