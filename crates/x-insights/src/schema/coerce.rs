//! Typed coercion of raw CSV cells.
//!
//! Numbers distinguish missing from invalid input (see [`NumericField`]).
//! Timestamps accept a range of common layouts; naive values are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{NumericField, iso_instant};
use crate::utils::clean_numeric_string;

// Bare calendar dates, checked before any generic parsing.
static DATE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[-/](\d{1,2})[-/](\d{1,2})$").expect("Invalid regex: date only")
});

/// Date-time layouts carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    // ISO-8601 with `Z`, `+hh:mm` or `+hhmm`, with or without seconds
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Date-time layouts without an offset, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%a %b %d %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%a, %b %d, %Y %H:%M",
];

/// Date layouts without a time, read as UTC midnight.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%a, %b %d, %Y",
    "%a %b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

/// Parse a numeric cell. Thousands separators are stripped.
///
/// Absent or blank cells are [`NumericField::Missing`]; anything else that
/// does not parse to a finite number is [`NumericField::Invalid`].
pub fn parse_number(cell: Option<&str>) -> NumericField {
    let Some(raw) = cell else {
        return NumericField::Missing;
    };
    if raw.trim().is_empty() {
        return NumericField::Missing;
    }

    match clean_numeric_string(raw).parse::<f64>() {
        Ok(v) if v.is_finite() => NumericField::Present(v),
        _ => NumericField::Invalid,
    }
}

/// Trimmed text; absent cells become the empty string.
pub fn to_text(cell: Option<&str>) -> String {
    cell.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Parse a post timestamp into a UTC instant.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if DATE_ONLY.is_match(value) {
        return parse_date_only(value).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // JavaScript-style strings carry a trailing "(Zone Name)".
    let value = match value.find(" (") {
        Some(pos) if value.ends_with(')') => &value[..pos],
        _ => value,
    };

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parse a timestamp and render it as ISO-8601 with milliseconds, or `""`.
pub fn to_timestamp_iso(raw: &str) -> String {
    iso_instant::format(parse_timestamp(raw).as_ref())
}

/// Parse an overview date into a calendar day (derived in UTC).
pub fn to_date_key(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if DATE_ONLY.is_match(value) {
        return parse_date_only(value);
    }
    parse_timestamp(value).map(|dt| dt.date_naive())
}

/// `YYYY-MM-DD` or `YYYY/MM/DD`; impossible calendar dates are rejected.
fn parse_date_only(value: &str) -> Option<NaiveDate> {
    let caps = DATE_ONLY.captures(value)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    let day = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
