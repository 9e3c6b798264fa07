//! Shared utilities for ingestion and reporting.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

// =============================================================================
// Header Utilities
// =============================================================================

/// Normalize a header (or file name) for fuzzy comparison.
///
/// Lowercases and strips every character that is not `a-z` or `0-9`, so
/// `"New Follows"`, `"new_follows"` and `"NewFollows"` compare equal.
///
/// # Example
///
/// ```rust,ignore
/// use x_insights::utils::normalize_header;
///
/// assert_eq!(normalize_header("NEW-follows!!"), "newfollows");
/// ```
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Thousands separator stripped before numeric parsing.
pub const THOUSANDS_SEPARATOR: char = ',';

/// Clean a string for numeric parsing by removing thousands separators.
pub fn clean_numeric_string(s: &str) -> String {
    s.trim().replace(THOUSANDS_SEPARATOR, "")
}

// =============================================================================
// Formatting Utilities
// =============================================================================

/// Format an integer count with `,` thousands separators.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(format_count(120000), "120,000");
/// ```
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a byte count as megabytes with one decimal place.
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / (1024.0 * 1024.0))
}

/// Format a megabyte limit, dropping the fraction for whole values.
pub fn format_limit_mb(megabytes: f64) -> String {
    if megabytes.fract() == 0.0 {
        format!("{megabytes:.0}")
    } else {
        format!("{megabytes:.1}")
    }
}

/// Shorten free text for one-line displays, appending `...` when cut.
pub fn truncate_text(value: &str, max_chars: usize) -> String {
    let clean = value.trim();
    if clean.is_empty() {
        return "(No text)".to_string();
    }
    if clean.chars().count() <= max_chars {
        return clean.to_string();
    }
    let kept: String = clean.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("New Follows"), "newfollows");
        assert_eq!(normalize_header("new_follows"), "newfollows");
        assert_eq!(normalize_header("NewFollows"), "newfollows");
        assert_eq!(normalize_header("NEW-follows!!"), "newfollows");
        assert_eq!(normalize_header("Reposts/Retweets"), "repostsretweets");
        assert_eq!(normalize_header("  !!  "), "");
    }

    #[test]
    fn test_normalize_header_drops_non_ascii() {
        assert_eq!(normalize_header("Impressões"), "impresses");
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string(" 1,234,567 "), "1234567");
        assert_eq!(clean_numeric_string("12.5"), "12.5");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(120000), "120,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(13 * 1024 * 1024), "13.0");
        assert_eq!(format_limit_mb(12.0), "12");
        assert_eq!(format_limit_mb(0.5), "0.5");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("   ", 10), "(No text)");
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghijkl", 10), "abcdefg...");
    }
}
