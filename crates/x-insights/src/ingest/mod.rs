//! Upload batch orchestration.
//!
//! An [`Ingestor`] applies the batch policy (file count, type and size gates),
//! tokenizes the accepted files one at a time in submission order, decides
//! each file's schema and loads the normalized rows into an
//! [`AnalyticsState`]. Every outcome is reported as a [`Diagnostic`]; nothing
//! in this module fails on bad input data.

pub mod progress;
mod report;

pub use progress::{ClosureProgressReporter, IngestProgress, IngestStage, ProgressReporter};
pub use report::{BatchReport, Diagnostic, FileReport, RecordKind, Resolution, Severity};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::{FileKind, classify};
use crate::config::IngestConfig;
use crate::schema::{normalize_content, normalize_overview};
use crate::state::AnalyticsState;
use crate::tokenizer::{CsvTokenizer, ParsedCsv};
use crate::types::{CanonicalField, join_labels};
use crate::utils::{format_count, format_limit_mb, format_megabytes};

// ============================================================================
// Upload files
// ============================================================================

#[derive(Debug, Clone)]
enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One file submitted for ingestion.
#[derive(Debug, Clone)]
pub struct UploadFile {
    name: String,
    size: u64,
    source: UploadSource,
}

impl UploadFile {
    /// A file on disk. Name and size are taken from the path and its metadata;
    /// an unreadable path is reported when the file is parsed.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Self {
            name,
            size,
            source: UploadSource::Path(path),
        }
    }

    /// An in-memory upload.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: UploadSource::Bytes(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            UploadSource::Path(p) => Some(p),
            UploadSource::Bytes(_) => None,
        }
    }

    fn is_csv(&self) -> bool {
        self.name.to_lowercase().ends_with(".csv")
    }
}

// ============================================================================
// Ingestor
// ============================================================================

/// Runs upload batches against an [`AnalyticsState`].
#[derive(Clone)]
pub struct Ingestor {
    config: IngestConfig,
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            reporter: None,
        }
    }

    /// Report progress through a closure.
    pub fn on_progress<F>(self, callback: F) -> Self
    where
        F: Fn(IngestProgress) + Send + Sync + 'static,
    {
        self.with_reporter(Arc::new(ClosureProgressReporter::new(callback)))
    }

    /// Report progress through `reporter`.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest `files` in order, loading each resolved file into `state`.
    pub fn ingest(&self, files: Vec<UploadFile>, state: &AnalyticsState) -> BatchReport {
        let (accepted, mut report) = self.validate_batch(files);
        if accepted.is_empty() {
            return self.finish_empty(report);
        }

        let tokenizer = self.tokenizer();
        let total = accepted.len();
        for (i, file) in accepted.iter().enumerate() {
            self.report(IngestProgress::parsing(&file.name, i + 1, total));
            let parsed = match &file.source {
                UploadSource::Path(path) => tokenizer.parse_path(path),
                UploadSource::Bytes(bytes) => tokenizer.parse_bytes(bytes),
            };
            report.files.push(self.resolve_file(&file.name, &parsed, state));
        }

        self.finish(report)
    }

    /// Like [`ingest`](Self::ingest), reading files with `tokio::fs`.
    ///
    /// Files are still processed one at a time in submission order.
    #[cfg(feature = "async")]
    pub async fn ingest_async(&self, files: Vec<UploadFile>, state: &AnalyticsState) -> BatchReport {
        let (accepted, mut report) = self.validate_batch(files);
        if accepted.is_empty() {
            return self.finish_empty(report);
        }

        let tokenizer = self.tokenizer();
        let total = accepted.len();
        for (i, file) in accepted.iter().enumerate() {
            self.report(IngestProgress::parsing(&file.name, i + 1, total));
            let parsed = match &file.source {
                UploadSource::Path(path) => match tokio::fs::read(path).await {
                    Ok(bytes) => tokenizer.parse_bytes(&bytes),
                    Err(e) => {
                        warn!("Could not read {}: {}", path.display(), e);
                        ParsedCsv::failed(format!("Could not read file: {e}"))
                    }
                },
                UploadSource::Bytes(bytes) => tokenizer.parse_bytes(bytes),
            };
            report.files.push(self.resolve_file(&file.name, &parsed, state));
        }

        self.finish(report)
    }

    /// Decide the schema of one tokenized file and load it into `state`.
    pub fn resolve_file(&self, file_name: &str, parsed: &ParsedCsv, state: &AnalyticsState) -> FileReport {
        let mut file = FileResolver {
            name: file_name,
            parsed,
            state,
            messages: Vec::new(),
        };

        if !parsed.errors.is_empty() {
            let text = parsed.errors.join("; ");
            if parsed.truncated {
                file.push(Diagnostic::error(text));
            } else {
                file.push(Diagnostic::warn(text));
            }
        }

        let resolution = if parsed.fields.is_empty() {
            file.push(Diagnostic::error("CSV headers were not detected."));
            Resolution::NoHeaders
        } else {
            file.resolve()
        };

        info!("{}: resolved as {:?}", file_name, resolution);

        FileReport {
            file_name: file_name.to_string(),
            resolution,
            messages: file.messages,
            row_count: parsed.row_count,
            truncated: parsed.truncated,
        }
    }

    fn tokenizer(&self) -> CsvTokenizer {
        CsvTokenizer::new().with_max_rows(self.config.max_rows_per_file)
    }

    /// Apply the file-count, file-type and file-size gates.
    fn validate_batch(&self, files: Vec<UploadFile>) -> (Vec<UploadFile>, BatchReport) {
        self.report(IngestProgress::validating());
        let mut report = BatchReport::default();

        let limit = self.config.max_files_per_batch;
        if files.len() > limit {
            warn!("Batch of {} files exceeds limit of {}", files.len(), limit);
            report.messages.push(Diagnostic::warn(format!(
                "Only the first {limit} files were processed in this upload."
            )));
        }

        let mut accepted = Vec::new();
        for file in files.into_iter().take(limit) {
            if !file.is_csv() {
                debug!("Rejected {}: not a CSV file", file.name);
                report.messages.push(Diagnostic::error(format!(
                    "{}: Unsupported file type. Please upload CSV files only.",
                    file.name
                )));
                continue;
            }

            if file.size > self.config.max_file_size_bytes {
                debug!("Rejected {}: {} bytes", file.name, file.size);
                report.messages.push(Diagnostic::error(format!(
                    "{}: File is too large ({} MB). Maximum allowed is {} MB.",
                    file.name,
                    format_megabytes(file.size),
                    format_limit_mb(self.config.max_file_size_mb())
                )));
                continue;
            }

            accepted.push(file);
        }

        (accepted, report)
    }

    fn finish_empty(&self, mut report: BatchReport) -> BatchReport {
        let update = IngestProgress::nothing_to_process();
        report.status = update.message.clone();
        self.report(update);
        report
    }

    fn finish(&self, mut report: BatchReport) -> BatchReport {
        let update = IngestProgress::complete();
        report.status = update.message.clone();
        self.report(update);
        report
    }

    fn report(&self, update: IngestProgress) {
        if let Some(reporter) = &self.reporter {
            reporter.report(update);
        }
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.config)
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}

// ============================================================================
// Per-file resolution
// ============================================================================

/// Outcome of trying one schema against a file.
enum Attempt {
    Loaded,
    Missing(Vec<CanonicalField>),
}

struct FileResolver<'a> {
    name: &'a str,
    parsed: &'a ParsedCsv,
    state: &'a AnalyticsState,
    messages: Vec<Diagnostic>,
}

impl FileResolver<'_> {
    fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(Diagnostic {
            severity: diagnostic.severity,
            text: format!("{}: {}", self.name, diagnostic.text),
        });
    }

    fn resolve(&mut self) -> Resolution {
        match classify(&self.parsed.fields, self.name) {
            FileKind::Content => self.resolve_as(RecordKind::Content),
            FileKind::Overview => self.resolve_as(RecordKind::Overview),
            FileKind::Unknown => self.resolve_unknown(),
        }
    }

    fn resolve_as(&mut self, kind: RecordKind) -> Resolution {
        match self.attempt(kind) {
            Attempt::Loaded => Resolution::Classified { kind },
            Attempt::Missing(missing) => {
                self.push(Diagnostic::error(format!(
                    "Missing required {} columns ({}).",
                    kind.as_str(),
                    join_labels(&missing)
                )));
                Resolution::Rejected { missing }
            }
        }
    }

    /// Try content first, then overview.
    fn resolve_unknown(&mut self) -> Resolution {
        let mut missing: Vec<CanonicalField> = Vec::new();
        for kind in [RecordKind::Content, RecordKind::Overview] {
            match self.attempt(kind) {
                Attempt::Loaded => {
                    self.push(Diagnostic::info(format!(
                        "Auto-detected this file as {} analytics.",
                        kind.as_str()
                    )));
                    return Resolution::Ambiguous { kind };
                }
                Attempt::Missing(fields) => {
                    for field in fields {
                        if !missing.contains(&field) {
                            missing.push(field);
                        }
                    }
                }
            }
        }

        self.push(Diagnostic::error(format!(
            "Could not classify CSV. Missing required columns ({}).",
            join_labels(&missing)
        )));
        Resolution::Rejected { missing }
    }

    fn attempt(&mut self, kind: RecordKind) -> Attempt {
        let (rows, fields) = (&self.parsed.rows, &self.parsed.fields);
        let loaded_rows = format_count(self.parsed.row_count);

        let (missing_optional, warnings, trailer) = match kind {
            RecordKind::Content => {
                let result = normalize_content(rows, fields);
                if !result.missing_required.is_empty() {
                    return Attempt::Missing(result.missing_required);
                }
                self.state.set_content_rows(
                    result.rows,
                    self.name,
                    result.missing_optional.clone(),
                );
                (result.missing_optional, result.warnings, "Metrics may be limited.")
            }
            RecordKind::Overview => {
                let result = normalize_overview(rows, fields);
                if !result.missing_required.is_empty() {
                    return Attempt::Missing(result.missing_required);
                }
                self.state.set_overview_rows(
                    result.rows,
                    self.name,
                    result.missing_optional.clone(),
                );
                (result.missing_optional, result.warnings, "Some trends may be hidden.")
            }
        };

        if !missing_optional.is_empty() {
            self.push(Diagnostic::warn(format!(
                "Optional columns missing ({}). {trailer}",
                join_labels(&missing_optional)
            )));
        }
        for warning in warnings {
            self.push(Diagnostic::warn(warning));
        }
        self.push(Diagnostic::success(format!(
            "Loaded {} analytics ({loaded_rows} rows).",
            kind.as_str()
        )));
        Attempt::Loaded
    }
}
