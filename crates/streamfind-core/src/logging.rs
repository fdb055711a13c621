//! Logging init from the `[logging]` config section.
//!
//! Resolution steps log at `debug`, per-target results at `info`, and
//! swallowed step failures at `warn`. The filter comes from `RUST_LOG` when
//! set, else from `[logging].filter`, else [`DEFAULT_FILTER`].

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub const DEFAULT_FILTER: &str = "info,streamfind_core=debug,streamfind=debug";

/// Filter directives to use, given the `RUST_LOG` value (if any).
fn filter_directives(env: Option<String>, cfg: &LoggingConfig) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| cfg.filter.clone().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    let directives = filter_directives(std::env::var(EnvFilter::DEFAULT_ENV).ok(), cfg);
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("invalid log filter {directives:?} ({e}), using {DEFAULT_FILTER:?}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// `<dir>/<file_name>`, with the XDG state dir standing in for an unset `dir`.
pub fn log_file_path(cfg: &LoggingConfig) -> Result<PathBuf> {
    let dir = match &cfg.dir {
        Some(dir) => dir.clone(),
        None => crate::config::state_dir()?,
    };
    Ok(dir.join(&cfg.file_name))
}

/// Appends structured logs to [`log_file_path`] and returns that path.
/// Errors (unwritable dir, subscriber already set) leave logging uninstalled
/// so the caller can fall back to [`init_logging_stderr`].
pub fn init_logging(cfg: &LoggingConfig) -> Result<PathBuf> {
    let path = log_file_path(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cfg))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;

    tracing::info!("streamfind logging to {}", path.display());
    Ok(path)
}

/// Logs to stderr only. A subscriber that is already installed is kept.
pub fn init_logging_stderr(cfg: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(cfg))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_precedence() {
        let mut cfg = LoggingConfig::default();
        assert_eq!(filter_directives(None, &cfg), DEFAULT_FILTER);

        cfg.filter = Some("warn".to_string());
        assert_eq!(filter_directives(None, &cfg), "warn");
        assert_eq!(filter_directives(Some("trace".to_string()), &cfg), "trace");
        assert_eq!(filter_directives(Some("  ".to_string()), &cfg), "warn");
    }

    #[test]
    fn log_file_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            dir: Some(dir.path().join("logs")),
            file_name: "channels.log".to_string(),
            filter: None,
        };
        assert_eq!(log_file_path(&cfg).unwrap(), dir.path().join("logs").join("channels.log"));
    }
}
