//! Diagnostics produced while ingesting an upload batch.

use serde::{Deserialize, Serialize};

use crate::types::CanonicalField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warn,
    Error,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Severity::Success, text)
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self::new(Severity::Warn, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }
}

/// The two canonical record shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Content,
    Overview,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Overview => "overview",
        }
    }
}

/// How a file's schema was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// The header heuristic picked `kind` and it normalized.
    Classified { kind: RecordKind },
    /// The heuristic could not tell; `kind` was the first schema that fit.
    Ambiguous { kind: RecordKind },
    /// No schema fit; `missing` lists the unresolved required fields.
    Rejected { missing: Vec<CanonicalField> },
    /// The file had no header row.
    NoHeaders,
}

impl Resolution {
    /// The record kind the file was loaded as, if it was loaded.
    pub fn loaded_kind(&self) -> Option<RecordKind> {
        match self {
            Self::Classified { kind } | Self::Ambiguous { kind } => Some(*kind),
            Self::Rejected { .. } | Self::NoHeaders => None,
        }
    }
}

/// Outcome for one processed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    pub resolution: Resolution,
    pub messages: Vec<Diagnostic>,
    pub row_count: usize,
    pub truncated: bool,
}

/// Outcome for one upload batch.
///
/// `messages` holds batch-level diagnostics (file count, type and size
/// rejections); they precede the per-file reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub messages: Vec<Diagnostic>,
    pub files: Vec<FileReport>,
    /// Final status line.
    pub status: String,
}

impl BatchReport {
    /// All diagnostics in display order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages
            .iter()
            .chain(self.files.iter().flat_map(|f| f.messages.iter()))
    }

    /// True when at least one file was loaded into the state.
    pub fn loaded_any(&self) -> bool {
        self.files.iter().any(|f| f.resolution.loaded_kind().is_some())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolution_serialization() {
        let json = serde_json::to_string(&Resolution::Ambiguous {
            kind: RecordKind::Overview,
        })
        .unwrap();
        assert_eq!(json, r#"{"outcome":"ambiguous","kind":"overview"}"#);

        let rejected = serde_json::to_string(&Resolution::Rejected {
            missing: vec![CanonicalField::CreatedAt],
        })
        .unwrap();
        assert_eq!(rejected, r#"{"outcome":"rejected","missing":["createdAt"]}"#);
    }

    #[test]
    fn test_batch_report_diagnostics_order() {
        let report = BatchReport {
            messages: vec![Diagnostic::warn("batch")],
            files: vec![FileReport {
                file_name: "a.csv".to_string(),
                resolution: Resolution::NoHeaders,
                messages: vec![Diagnostic::error("file")],
                row_count: 0,
                truncated: false,
            }],
            status: String::new(),
        };

        let texts: Vec<&str> = report.diagnostics().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["batch", "file"]);
        assert!(!report.loaded_any());
        assert!(report.has_errors());
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        assert_eq!(Severity::Success.as_str(), "success");
    }
}
