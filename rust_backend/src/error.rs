//! Error types shared across the crate.
//!
//! Failures fall into three groups: configuration problems found before a run
//! starts, transient problems that only shrink a result set, and fatal
//! problems that abort the current exposure search.

use std::path::PathBuf;

/// Result type for catalog retrieval and parsing
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for the exposure convergence engine
pub type ExposureResult<T> = Result<T, ExposureError>;

/// Result type for settings loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type for catalog sources.
///
/// All variants are transient from the caller's point of view: a failing
/// source contributes zero events and the remaining sources are kept.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Catalog file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Whether another attempt could succeed: connection problems, timeouts
    /// and server-side (5xx) statuses.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Http(_) | CatalogError::Timeout(_) => true,
            CatalogError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Http(err.to_string())
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

/// How the host should treat a failed exposure search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Pre-flight validation failed; nothing was attempted.
    Skipped,
    /// The run was aborted by an external cancellation signal.
    Cancelled,
    /// The run started and failed for a specific reason.
    Fatal,
}

/// Error type for the exposure convergence engine.
#[derive(Debug, thiserror::Error)]
pub enum ExposureError {
    #[error("Execution skipped: {}", .0.join("; "))]
    Skipped(Vec<String>),

    #[error("Plate solve failed: {0}")]
    PlateSolveFailed(String),

    #[error("Target star could not be found in the image")]
    TargetStarNotFound,

    #[error("Image is blown out: exposure times {first}s and {second}s are too close after halving")]
    BlownOut { first: f64, second: f64 },

    #[error("Computed exposure time is negative ({0:.2}s), the regression is unusable")]
    NegativeExposure(f64),

    #[error("Cannot fit exposure against brightness over {0} trials")]
    DegenerateRegression(usize),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Star detection failed: {0}")]
    Detection(String),

    #[error("Exposure search cancelled")]
    Cancelled,

    #[error("Star list export failed: {0}")]
    StarList(String),
}

impl ExposureError {
    /// Classifies the error for the host's retry or skip policy.
    pub fn severity(&self) -> Severity {
        match self {
            ExposureError::Skipped(_) => Severity::Skipped,
            ExposureError::Cancelled => Severity::Cancelled,
            _ => Severity::Fatal,
        }
    }
}

/// Error type for loading and validating settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid horizon profile: {0}")]
    Horizon(String),
}

/// Error raised when an event is built with inconsistent times.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("Event '{name}' has unordered times: start {start}, mid {mid}, end {end}")]
    UnorderedTimes {
        name: String,
        start: f64,
        mid: f64,
        end: f64,
    },

    #[error("Event '{name}' has a non-finite Julian date")]
    NonFinite { name: String },
}
