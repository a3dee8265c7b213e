//! Unified error types for metagen.
//!
//! One taxonomy shared by the cache, the fetch client and the runner so
//! that callers can tell transient network trouble apart from malformed
//! data and from internal invariant violations.

use std::path::PathBuf;

pub use crate::config::ConfigError;

/// Unified error type for the metagen crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cache storage read/write failure. Never retried by the cache itself.
    #[error("cache I/O error at '{path}': {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache key that would escape its namespace directory.
    #[error("invalid cache key '{0}'")]
    InvalidCacheKey(String),

    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("network error while trying to {method} '{url}': {reason}")]
    Network { method: &'static str, url: String, reason: String },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientInit(String),

    /// Non-success HTTP status outside the handled 304 path.
    #[error("got {status} while trying to {method} '{url}'")]
    HttpStatus { method: &'static str, url: String, status: u16 },

    /// Malformed upstream payload or a required field missing.
    /// Retrying cannot fix malformed data, so this fails immediately.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// A remote archive whose structure could not be parsed.
    #[error("malformed archive at '{url}': {reason}")]
    Archive { url: String, reason: String },

    /// A goal's satisfied-dependency counter exceeded its declared
    /// dependency count. Indicates duplicate registration or a logic
    /// defect in the runner, not a transient condition.
    #[error("satisfied counter exceeded the {declared} declared deps for goal '{goal}'")]
    DependencyOverflow { goal: String, declared: usize },

    /// Output directory read/write failure.
    #[error("output I/O error at '{path}': {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output record's version id is unsafe to use as a file name.
    #[error("invalid version id '{0}'")]
    UnsafeVersionId(String),

    /// A background task could not be joined.
    #[error("task failed: {0}")]
    Task(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Wrap an I/O error with the path it occurred at.
    pub fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::CacheIo { path: path.into(), source }
    }

    /// Wrap an I/O error on an output file with the path it occurred at.
    pub fn output_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::OutputIo { path: path.into(), source }
    }
}
