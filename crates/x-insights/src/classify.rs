//! Heuristic detection of the export kind from headers and file name.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::normalize_header;

const CONTENT_MARKERS: &[&str] = &[
    "posttext",
    "tweettext",
    "text",
    "tweet",
    "post",
    "content",
    "body",
    "createdat",
    "posttime",
    "tweettime",
    "timestamp",
];

const OVERVIEW_MARKERS: &[&str] = &["date", "day", "engagements"];

/// The two export kinds, plus "could not tell".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Content,
    Overview,
    Unknown,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Overview => "overview",
            Self::Unknown => "unknown",
        }
    }
}

/// Guess whether a file is a content or overview export.
///
/// Headers decide when exactly one family of markers is present alongside
/// an impressions-like column; otherwise the file name is consulted.
pub fn classify(fields: &[String], file_name: &str) -> FileKind {
    let normalized: Vec<String> = fields.iter().map(|f| normalize_header(f)).collect();
    let normalized_name = normalize_header(file_name);

    let has_marker = |markers: &[&str]| {
        normalized
            .iter()
            .any(|field| markers.iter().any(|m| field.contains(m)))
    };
    let has_content = has_marker(CONTENT_MARKERS);
    let has_overview = has_marker(OVERVIEW_MARKERS);
    let has_impressions = normalized
        .iter()
        .any(|field| field.contains("impression") || field.contains("view"));

    let kind = if has_content && has_impressions && !has_overview {
        FileKind::Content
    } else if has_overview && has_impressions && !has_content {
        FileKind::Overview
    } else if normalized_name.contains("overview") && has_impressions {
        FileKind::Overview
    } else if ["content", "tweet", "post"]
        .iter()
        .any(|hint| normalized_name.contains(hint))
        && has_impressions
    {
        FileKind::Content
    } else {
        FileKind::Unknown
    };

    debug!("Classified {} as {}", file_name, kind.as_str());
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_content_headers() {
        let kind = classify(&fields(&["Tweet text", "Time", "Impressions"]), "export.csv");
        assert_eq!(kind, FileKind::Content);
    }

    #[test]
    fn test_overview_headers() {
        let kind = classify(&fields(&["Date", "Impressions", "Likes"]), "export.csv");
        assert_eq!(kind, FileKind::Overview);
    }

    #[test]
    fn test_mixed_markers_fall_back_to_file_name() {
        let headers = fields(&["Post text", "Date", "Impressions"]);
        assert_eq!(classify(&headers, "data.csv"), FileKind::Unknown);
        assert_eq!(classify(&headers, "account_overview_analytics.csv"), FileKind::Overview);
        assert_eq!(classify(&headers, "account_content_analytics.csv"), FileKind::Content);
    }

    #[test]
    fn test_file_name_requires_impressions() {
        let headers = fields(&["Post text", "Date"]);
        assert_eq!(classify(&headers, "overview.csv"), FileKind::Unknown);
    }

    #[test]
    fn test_no_markers() {
        let kind = classify(&fields(&["foo", "bar", "Views"]), "misc.csv");
        assert_eq!(kind, FileKind::Unknown);
    }
}
