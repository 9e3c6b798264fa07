//! Custom error types for the insights crate.
//!
//! Data-quality problems in uploaded CSVs are never errors: they surface as
//! diagnostics (see [`crate::ingest`]). The types in this module cover the
//! remaining exceptional paths (persistence, tabular export, configuration).
//!
//! Errors are serializable so a front end can display them directly.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the insights crate.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An export was requested but no rows are loaded.
    #[error("No data loaded")]
    NoDataLoaded,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightsError>,
    },
}

impl InsightsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoDataLoaded => "NO_DATA_LOADED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is recoverable (i.e., not a fundamental failure).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoDataLoaded | Self::InvalidConfig(_))
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for InsightsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<crate::config::ConfigValidationError> for InsightsError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        InsightsError::InvalidConfig(err.to_string())
    }
}

/// Result type alias for insights operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Io(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Polars(e).with_context(context))
    }
}
