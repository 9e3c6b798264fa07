//! Progress reporting for upload batches.
//!
//! # Example
//!
//! ```rust,ignore
//! use x_insights::{AnalyticsState, IngestConfig, Ingestor};
//!
//! let state = AnalyticsState::new();
//! let report = Ingestor::new(IngestConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .ingest(files, &state);
//! ```

use serde::{Deserialize, Serialize};

/// Phases of one upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    /// Checking file count, type and size
    Validating,
    /// Tokenizing and normalizing one file
    Parsing,
    /// Every accepted file was processed
    Complete,
    /// Nothing in the batch passed validation
    NothingToProcess,
}

impl IngestStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validating => "Validating",
            Self::Parsing => "Parsing",
            Self::Complete => "Complete",
            Self::NothingToProcess => "Nothing to process",
        }
    }
}

/// One status change, suitable for a status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestProgress {
    pub stage: IngestStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable status text
    pub message: String,

    /// File being processed (1-based), for the parsing stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_index: Option<usize>,

    /// Number of accepted files, for the parsing stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_total: Option<usize>,
}

impl IngestProgress {
    pub fn validating() -> Self {
        Self {
            stage: IngestStage::Validating,
            progress: 0.0,
            message: "Validating selected files...".to_string(),
            file_index: None,
            file_total: None,
        }
    }

    /// Progress for the `index`-th (1-based) of `total` files.
    pub fn parsing(file_name: &str, index: usize, total: usize) -> Self {
        let progress = if total > 0 {
            index.saturating_sub(1) as f32 / total as f32
        } else {
            0.0
        };
        Self {
            stage: IngestStage::Parsing,
            progress: progress.clamp(0.0, 1.0),
            message: format!("Parsing {file_name} ({index}/{total})..."),
            file_index: Some(index),
            file_total: Some(total),
        }
    }

    pub fn complete() -> Self {
        Self {
            stage: IngestStage::Complete,
            progress: 1.0,
            message: "CSV processing complete.".to_string(),
            file_index: None,
            file_total: None,
        }
    }

    pub fn nothing_to_process() -> Self {
        Self {
            stage: IngestStage::NothingToProcess,
            progress: 1.0,
            message: "No valid CSV files were selected.".to_string(),
            file_index: None,
            file_total: None,
        }
    }
}

/// Receives progress updates while a batch is ingested.
///
/// Implementations must be `Send + Sync` so a reporter can forward updates
/// to another thread.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: IngestProgress);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(IngestProgress) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(IngestProgress) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(IngestProgress) + Send + Sync,
{
    fn report(&self, update: IngestProgress) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(IngestProgress: Send, Sync);
