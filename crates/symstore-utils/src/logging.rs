//! # Logging Utilities
//!
//! Logging infrastructure for symstore using `tracing`.
//!
//! Console output always goes to stderr so that the command line tool can print
//! symbol listings on stdout without interleaving diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use symstore_utils::init_logging;
//!
//! init_logging().expect("Failed to initialize logging");
//! tracing::info!("Loaded debug info");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=symstore_core=trace`)
//! - `SYMSTORE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `SYMSTORE_LOG_FILE`: Optional path to a log file, rolled daily

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "SYMSTORE_LOG_FORMAT";

/// Environment variable naming an optional log file.
pub const LOG_FILE_ENV: &str = "SYMSTORE_LOG_FILE";

// Keeps the file writer thread alive for the life of the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON lines
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for the command line tool)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level, logs every record decoded
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG`, `SYMSTORE_LOG_FORMAT` and `SYMSTORE_LOG_FILE`. An unknown
/// format falls back to pretty output; a missing or unparsable `RUST_LOG` falls
/// back to `warn`.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed or the log
/// file directory cannot be created.
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()));
    install(format, filter, log_file_from_env())
}

/// Initialize logging with an explicit level and format
///
/// The level wins over `RUST_LOG`; `SYMSTORE_LOG_FILE` is still honoured.
///
/// ```rust,no_run
/// use symstore_utils::{init_logging_with_level, LogFormat, LogLevel};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Json).expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    let filter = EnvFilter::new(Level::from(level).to_string());
    install(format, filter, log_file_from_env())
}

fn log_file_from_env() -> Option<PathBuf>
{
    env::var_os(LOG_FILE_ENV).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn install(format: LogFormat, filter: EnvFilter, log_file: Option<PathBuf>) -> Result<(), LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![format_layer(format, io::stderr, true, filter.clone())];

    if let Some(path) = log_file {
        let (directory, file_name) = split_log_path(&path)?;
        std::fs::create_dir_all(&directory)?;
        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(format, writer, false, filter));

        // A second successful init is impossible, so a lost guard here is never the live one.
        let _ = FILE_GUARD.set(guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError>
{
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, PathBuf::from(file_name)))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Log file path has no file name
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    /// A global subscriber was already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
