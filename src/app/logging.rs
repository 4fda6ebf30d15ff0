//! Tracing subscriber setup.
//!
//! CLI subcommands log to stderr. The TUI owns the terminal, so it logs to a
//! file when `--log-file` is given and nowhere otherwise.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Filter used when neither `--log` nor `PDASH_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    Disabled,
}

/// Pick the sink for a run: TUI runs never log to the terminal.
pub fn log_target(tui: bool, log_file: Option<&Path>) -> LogTarget<'_> {
    match (log_file, tui) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Disabled,
        (None, false) => LogTarget::Stderr,
    }
}

pub fn build_filter(filter: Option<&str>) -> EnvFilter {
    filter
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(filter: Option<&str>, target: LogTarget<'_>) -> Result<(), AppError> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(filter));
    match target {
        LogTarget::Disabled => {}
        LogTarget::Stderr => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
        LogTarget::File(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(4, format!("Failed to create log file '{}': {e}", path.display())))?;
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_without_log_file_is_silent() {
        assert_eq!(log_target(true, None), LogTarget::Disabled);
        assert_eq!(log_target(false, None), LogTarget::Stderr);
        let path = Path::new("pdash.log");
        assert_eq!(log_target(true, Some(path)), LogTarget::File(path));
    }

    #[test]
    fn invalid_filter_falls_back_to_default() {
        assert_eq!(build_filter(Some("portfolio_dash=loud")).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(build_filter(Some("debug")).to_string(), "debug");
    }
}
