//! File-backed logging bootstrap.
//!
//! Logs go to rotating files in the data directory so the terminal UI never
//! gets interleaved output. Initialization happens at most once per process.

use anyhow::{anyhow, bail, Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "dayplan";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
pub const LOG_LEVEL_ENV: &str = "DAYPLAN_LOG";

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Start the file logger.
///
/// Repeating the call with the same level and directory is a no-op; asking
/// for a different one after the first call is an error.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("creating log directory {:?}", log_dir))?;
        let logger = Logger::try_with_str(level)
            .map_err(|err| anyhow!("invalid log level `{level}`: {err}"))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .context("starting logger")?;
        info!(
            "event=app_start status=ok version={} level={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            level,
            log_dir.display()
        );
        Ok(LoggingState {
            level,
            log_dir: log_dir.to_path_buf(),
            _logger: logger,
        })
    })?;

    if state.log_dir != log_dir {
        bail!(
            "logging already initialized at {:?}; refusing to switch to {:?}",
            state.log_dir,
            log_dir
        );
    }
    if state.level != level {
        bail!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level,
            level
        );
    }
    Ok(())
}

/// Level from the environment, then the config, then the build mode.
pub fn resolve_level(configured: Option<&str>) -> String {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| default_log_level().to_string())
}

pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => bail!("unsupported log level `{other}`; expected trace|debug|info|warn|error|off"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_normalize() {
        assert_eq!(normalize_level(" WARNING ").unwrap(), "warn");
        assert_eq!(normalize_level("debug").unwrap(), "debug");
        assert!(normalize_level("loud").is_err());
    }

    #[test]
    fn configured_level_beats_default() {
        if std::env::var(LOG_LEVEL_ENV).is_err() {
            assert_eq!(resolve_level(Some("warn")), "warn");
            assert_eq!(resolve_level(None), default_log_level());
        }
    }

    #[test]
    fn init_is_idempotent_and_sticky() {
        let dir = tempfile::tempdir().unwrap();
        init_logging("info", dir.path()).unwrap();
        init_logging("INFO", dir.path()).unwrap();
        assert!(init_logging("debug", dir.path()).is_err());
        let other = tempfile::tempdir().unwrap();
        assert!(init_logging("info", other.path()).is_err());
    }
}
