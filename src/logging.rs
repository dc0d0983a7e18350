/// Structured logging for the asset backend.
///
/// Provides context-rich logging with layer/variable identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for server deployments. Resolution and parsing never
/// print directly — they log through here and surface diagnostics to the
/// caller as data.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{LayerDiagnostic, MatchKind};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Layer Sources
// ---------------------------------------------------------------------------

/// Which part of the asset pipeline produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSource {
    Raster,
    Facility,
    ClassLayer,
    Catalog,
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSource::Raster => write!(f, "RASTER"),
            LayerSource::Facility => write!(f, "FACILITY"),
            LayerSource::ClassLayer => write!(f, "CLASS"),
            LayerSource::Catalog => write!(f, "CATALOG"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure — a given day's file may simply not have been
    /// generated yet; the fallback chain handles it.
    Expected,
    /// Unexpected failure — a file exists but is unreadable or malformed,
    /// indicating a broken upstream export.
    Unexpected,
    /// Cannot determine whether this is expected or not.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies a layer diagnostic for log routing: missing assets are the
/// normal degraded path, malformed files are upstream defects.
pub fn classify_diagnostic(diagnostic: &LayerDiagnostic) -> FailureType {
    match diagnostic {
        LayerDiagnostic::AssetMissing { .. } => FailureType::Expected,
        LayerDiagnostic::MalformedJson { .. } => FailureType::Unexpected,
        LayerDiagnostic::NotFeatureCollection { .. } => FailureType::Unexpected,
        LayerDiagnostic::FeaturesDropped { kept, .. } => {
            // Losing every feature suggests a schema mismatch, not a few
            // bad rows.
            if *kept == 0 {
                FailureType::Unexpected
            } else {
                FailureType::Unknown
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger { min_level, log_file };
        *LOGGER.lock().unwrap() = Some(logger);
    }

    fn log(&self, level: LogLevel, source: LayerSource, key: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let key_part = key.map(|k| format!(" [{}]", k)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, key_part, message);

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
            LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger. Logging is a no-op until this is called,
/// which keeps library use silent by default.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

pub fn info(source: LayerSource, key: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, source, key, message);
    }
}

pub fn warn(source: LayerSource, key: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, source, key, message);
    }
}

pub fn error(source: LayerSource, key: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, source, key, message);
    }
}

pub fn debug(source: LayerSource, key: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, source, key, message);
    }
}

/// Logs a layer diagnostic at the level its classification implies:
/// expected failures at debug, upstream defects at error, everything else
/// at warn.
pub fn log_diagnostic(source: LayerSource, key: Option<&str>, diagnostic: &LayerDiagnostic) {
    let failure_type = classify_diagnostic(diagnostic);
    let message = format!("[{}] {}", failure_type, diagnostic);

    match failure_type {
        FailureType::Expected => debug(source, key, &message),
        FailureType::Unexpected => error(source, key, &message),
        FailureType::Unknown => warn(source, key, &message),
    }
}

/// Logs a resolution outcome summary for one render request.
pub fn log_resolution(source: LayerSource, key: &str, match_kind: MatchKind) {
    match match_kind {
        MatchKind::Exact => debug(source, Some(key), "resolved exactly"),
        MatchKind::DateFallback | MatchKind::MostRecent => {
            info(source, Some(key), &format!("resolved via {}", match_kind))
        }
        MatchKind::NotFound => debug(source, Some(key), "no asset found"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
