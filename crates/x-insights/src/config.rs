//! Configuration types for CSV ingestion.
//!
//! This module provides the upload limits using the builder pattern.
//! Each limit is enforced independently:
//!
//! - file-count and file-size limits reject files before parsing begins;
//! - the row limit truncates a file mid-parse.

use serde::{Deserialize, Serialize};

/// Default maximum file size in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 12;

/// Default maximum file size in bytes.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024;

/// Default maximum number of data rows kept per file.
pub const DEFAULT_MAX_ROWS_PER_FILE: usize = 120_000;

/// Default maximum number of files processed per upload batch.
pub const DEFAULT_MAX_FILES_PER_BATCH: usize = 6;

/// Limits applied while ingesting an upload batch.
///
/// Use [`IngestConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use x_insights::config::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .max_rows_per_file(50_000)
///     .max_files_per_batch(2)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Files larger than this are rejected before parsing.
    /// Default: 12 MiB
    pub max_file_size_bytes: u64,

    /// Parsing stops once this many non-empty data rows were kept.
    /// Default: 120,000
    pub max_rows_per_file: usize,

    /// Only the first N files of a batch are processed.
    /// Default: 6
    pub max_files_per_batch: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_rows_per_file: DEFAULT_MAX_ROWS_PER_FILE,
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
        }
    }
}

impl IngestConfig {
    /// Create a new configuration builder.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_file_size_bytes == 0 {
            return Err(ConfigValidationError::ZeroLimit {
                field: "max_file_size_bytes".to_string(),
            });
        }

        if self.max_rows_per_file == 0 {
            return Err(ConfigValidationError::ZeroLimit {
                field: "max_rows_per_file".to_string(),
            });
        }

        if self.max_files_per_batch == 0 {
            return Err(ConfigValidationError::ZeroLimit {
                field: "max_files_per_batch".to_string(),
            });
        }

        Ok(())
    }

    /// The file size limit expressed in megabytes, for user-facing messages.
    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid limit for '{field}': must be at least 1")]
    ZeroLimit { field: String },
}

/// Builder for [`IngestConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    max_file_size_bytes: Option<u64>,
    max_rows_per_file: Option<usize>,
    max_files_per_batch: Option<usize>,
}

impl IngestConfigBuilder {
    /// Set the maximum accepted file size in bytes.
    pub fn max_file_size_bytes(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = Some(bytes);
        self
    }

    /// Set the maximum accepted file size in whole megabytes.
    pub fn max_file_size_mb(mut self, megabytes: u64) -> Self {
        self.max_file_size_bytes = Some(megabytes.saturating_mul(1024 * 1024));
        self
    }

    /// Set the maximum number of data rows kept per file.
    pub fn max_rows_per_file(mut self, rows: usize) -> Self {
        self.max_rows_per_file = Some(rows);
        self
    }

    /// Set the maximum number of files processed per batch.
    pub fn max_files_per_batch(mut self, files: usize) -> Self {
        self.max_files_per_batch = Some(files);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `IngestConfig` or an error if validation fails.
    pub fn build(self) -> Result<IngestConfig, ConfigValidationError> {
        let config = IngestConfig {
            max_file_size_bytes: self
                .max_file_size_bytes
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            max_rows_per_file: self.max_rows_per_file.unwrap_or(DEFAULT_MAX_ROWS_PER_FILE),
            max_files_per_batch: self
                .max_files_per_batch
                .unwrap_or(DEFAULT_MAX_FILES_PER_BATCH),
        };

        config.validate()?;
        Ok(config)
    }
}

static_assertions::assert_impl_all!(IngestConfig: Send, Sync);
