//! Normalized rows as polars `DataFrame`s, and CSV export.
//!
//! Column names follow the row wire contract (camelCase). Missing and
//! invalid numeric cells become nulls; an absent post timestamp becomes an
//! empty string.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::info;

use crate::error::{InsightsError, Result, ResultExt};
use crate::state::AnalyticsSnapshot;
use crate::types::{ContentRow, NumericField, OverviewRow, iso_instant};

pub const CONTENT_EXPORT_FILE: &str = "content.csv";
pub const OVERVIEW_EXPORT_FILE: &str = "overview.csv";

fn numeric_column<T>(name: &str, rows: &[T], field: impl Fn(&T) -> NumericField) -> Column {
    let values: Vec<Option<f64>> = rows.iter().map(|row| field(row).value()).collect();
    Series::new(name.into(), values).into()
}

/// One row per post.
pub fn content_frame(rows: &[ContentRow]) -> Result<DataFrame> {
    let ids: Vec<Option<&str>> = rows.iter().map(|r| r.id.as_deref()).collect();
    let texts: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
    let created: Vec<String> = rows
        .iter()
        .map(|r| iso_instant::format(r.created_at.as_ref()))
        .collect();
    let impressions: Vec<f64> = rows.iter().map(|r| r.impressions).collect();

    let df = DataFrame::new(vec![
        Series::new("id".into(), ids).into(),
        Series::new("text".into(), texts).into(),
        Series::new("createdAt".into(), created).into(),
        Series::new("impressions".into(), impressions).into(),
        numeric_column("likes", rows, |r| r.likes),
        numeric_column("replies", rows, |r| r.replies),
        numeric_column("reposts", rows, |r| r.reposts),
        numeric_column("bookmarks", rows, |r| r.bookmarks),
        numeric_column("shares", rows, |r| r.shares),
        numeric_column("profileVisits", rows, |r| r.profile_visits),
        numeric_column("newFollows", rows, |r| r.new_follows),
    ])?;
    Ok(df)
}

/// One row per overview day, dates as `YYYY-MM-DD`.
pub fn overview_frame(rows: &[OverviewRow]) -> Result<DataFrame> {
    let dates: Vec<String> = rows.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect();
    let impressions: Vec<f64> = rows.iter().map(|r| r.impressions).collect();

    let df = DataFrame::new(vec![
        Series::new("date".into(), dates).into(),
        Series::new("impressions".into(), impressions).into(),
        numeric_column("engagements", rows, |r| r.engagements),
        numeric_column("profileVisits", rows, |r| r.profile_visits),
        numeric_column("newFollows", rows, |r| r.new_follows),
        numeric_column("likes", rows, |r| r.likes),
        numeric_column("bookmarks", rows, |r| r.bookmarks),
        numeric_column("shares", rows, |r| r.shares),
        numeric_column("unfollows", rows, |r| r.unfollows),
        numeric_column("replies", rows, |r| r.replies),
        numeric_column("reposts", rows, |r| r.reposts),
        numeric_column("createPost", rows, |r| r.create_post),
        numeric_column("videoViews", rows, |r| r.video_views),
        numeric_column("mediaViews", rows, |r| r.media_views),
    ])?;
    Ok(df)
}

/// Writes `df` as a comma-separated file with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Failed to write {}", path.display()))
}

/// Writes the loaded rows to `content.csv` and/or `overview.csv` in `dir`.
///
/// Only non-empty row sets are written. Returns the written paths.
pub fn export_snapshot(snapshot: &AnalyticsSnapshot, dir: &Path) -> Result<Vec<PathBuf>> {
    if snapshot.is_empty() {
        return Err(InsightsError::NoDataLoaded);
    }
    fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    if !snapshot.content_rows.is_empty() {
        let path = dir.join(CONTENT_EXPORT_FILE);
        write_csv(&mut content_frame(&snapshot.content_rows)?, &path)?;
        written.push(path);
    }
    if !snapshot.overview_rows.is_empty() {
        let path = dir.join(OVERVIEW_EXPORT_FILE);
        write_csv(&mut overview_frame(&snapshot.overview_rows)?, &path)?;
        written.push(path);
    }

    for path in &written {
        info!("Exported {}", path.display());
    }
    Ok(written)
}
