//! Logging built on the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `SKILLRUN_LOG`: Filter directive (like `RUST_LOG`), e.g., `skillrun_tools=debug`
//! - `SKILLRUN_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `SKILLRUN_LOG_DIR`: Directory for file logs (default `~/.skillrun/logs`)
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "pretty"
//! file = false
//! ```
//!
//! # Example
//!
//! ```no_run
//! use skillrun_core::logging;
//! use skillrun_core::config::LoggingConfig;
//!
//! let _guard = logging::init_logging(&LoggingConfig::default())?;
//! # Ok::<(), skillrun_core::Error>(())
//! ```

use crate::Error;
use crate::config::LoggingConfig;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// All available log formats.
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    /// Get the string representation of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let filter = env::var("SKILLRUN_LOG")
        .ok()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.level.clone());

    EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Determine the stderr format: env override, then config, then TTY detection.
fn detect_format(config: &LoggingConfig) -> LogFormat {
    if let Ok(fmt_str) = env::var("SKILLRUN_LOG_FORMAT")
        && let Some(fmt) = LogFormat::parse_str(&fmt_str)
    {
        return fmt;
    }

    match LogFormat::parse_str(&config.format) {
        Some(LogFormat::Pretty) if !atty::is(atty::Stream::Stderr) => LogFormat::Compact,
        Some(fmt) => fmt,
        None => LogFormat::Compact,
    }
}

/// Get the log directory path.
fn log_dir() -> Result<PathBuf, Error> {
    if let Ok(custom_dir) = env::var("SKILLRUN_LOG_DIR") {
        return Ok(PathBuf::from(custom_dir));
    }

    dirs::home_dir()
        .map(|home| home.join(".skillrun").join("logs"))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Initialize the global tracing subscriber.
///
/// Installs an env-based filter, a stderr layer in the selected format and, when
/// `config.file` is set, a daily-rotated JSON file layer. The returned guard must be
/// held for the lifetime of the process so buffered file output is flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, Error> {
    let env_filter = build_env_filter(config);
    let format = detect_format(config);
    let registry = Registry::default().with(env_filter);

    let (file_layer, guard) = if config.file {
        let dir = log_dir()?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(dir, "skillrun.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(fmt::layer().json().with_writer(non_blocking)), Some(guard))
    } else {
        (None, None)
    };

    let registry = registry.with(file_layer);
    let result = match format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json().with_writer(io::stderr)).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact().with_writer(io::stderr)).try_init(),
    };
    result.map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}

/// Shorten captured process output before it goes into a log event.
pub fn truncate_for_log(content: &str, max_chars: usize) -> String {
    let total = content.chars().count();
    if total <= max_chars {
        return content.to_string();
    }

    let mut truncated = content.chars().take(max_chars).collect::<String>();
    truncated.push_str(&format!("... ({} total chars)", total));
    truncated
}

/// Sanitize file paths for logging (remove home directory).
pub fn sanitize_path(path: &std::path::Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }

    path.display().to_string()
}
