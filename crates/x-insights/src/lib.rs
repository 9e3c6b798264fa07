//! Social-media analytics ingestion and metrics.
//!
//! Turns loosely structured CSV exports of post performance ("content") and
//! daily account activity ("overview") into two canonical row shapes, and
//! derives the aggregates a dashboard renders from them.
//!
//! # Overview
//!
//! - **Tokenizing**: row ceiling, blank-row skipping, parse errors collected
//!   without halting ([`tokenizer`])
//! - **Schema resolution**: messy headers mapped to canonical fields through
//!   alias tables and normalized substring matching ([`schema`])
//! - **Coercion**: numbers, text, timestamps and date keys, with missing and
//!   invalid values kept apart ([`NumericField`])
//! - **Classification**: content, overview or unknown, with a fallback that
//!   tries both schemas ([`classify`], [`ingest`])
//! - **Metrics**: rates, rankings, heatmaps, streaks, viral days, funnels and
//!   trends ([`metrics`])
//! - **State**: the loaded rows behind one shareable object with optional
//!   persistence ([`AnalyticsState`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use x_insights::{AnalyticsState, Dashboard, IngestConfig, Ingestor, UploadFile};
//!
//! let state = AnalyticsState::new();
//! let report = Ingestor::new(IngestConfig::default())
//!     .on_progress(|update| println!("{}", update.message))
//!     .ingest(
//!         vec![
//!             UploadFile::from_path("content.csv"),
//!             UploadFile::from_path("overview.csv"),
//!         ],
//!         &state,
//!     );
//!
//! for message in report.diagnostics() {
//!     println!("[{}] {}", message.severity.as_str(), message.text);
//! }
//!
//! let dashboard = Dashboard::compute(&state.snapshot(), None);
//! for (_, takeaway) in &dashboard.takeaways {
//!     println!("{takeaway}");
//! }
//! ```
//!
//! # Configuration
//!
//! Upload limits live in [`IngestConfig`]:
//!
//! ```rust,ignore
//! use x_insights::IngestConfig;
//!
//! let config = IngestConfig::builder()
//!     .max_file_size_mb(8)
//!     .max_rows_per_file(50_000)
//!     .max_files_per_batch(4)
//!     .build()?;
//! ```
//!
//! # Data quality
//!
//! Bad input never produces an `Err`. Dropped rows, invalid cells, missing
//! columns and truncation all surface as [`Diagnostic`]s in the
//! [`BatchReport`]; [`InsightsError`] is reserved for I/O, persistence and
//! export failures.

pub mod classify;
pub mod config;
pub mod demo;
pub mod error;
pub mod frame;
pub mod ingest;
pub mod metrics;
pub mod schema;
pub mod state;
pub mod tokenizer;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use classify::{FileKind, classify};
pub use config::{ConfigValidationError, IngestConfig, IngestConfigBuilder};
pub use error::{InsightsError, Result as InsightsResult, ResultExt};
pub use frame::{content_frame, export_snapshot, overview_frame};
pub use ingest::{
    BatchReport, ClosureProgressReporter, Diagnostic, FileReport, IngestProgress, IngestStage,
    Ingestor, ProgressReporter, RecordKind, Resolution, Severity, UploadFile,
};
pub use metrics::{Dashboard, HeatmapMetric, InsightCard, InsightsReport};
pub use schema::{normalize_content, normalize_overview};
pub use state::{AnalyticsSnapshot, AnalyticsState, JsonFileStore, RowStore};
pub use tokenizer::{CsvTokenizer, ParsedCsv, RawRow};
pub use types::{CanonicalField, ContentRow, NormalizationResult, NumericField, OverviewRow};
