//! Integration tests for ingestion, normalization and the metrics engine.
//!
//! These tests drive the public API end to end using the CSV fixtures.

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use x_insights::metrics::{detect_viral_days, engagement_rate, streak_summary};
use x_insights::{
    AnalyticsState, BatchReport, CanonicalField, Dashboard, HeatmapMetric, IngestConfig,
    Ingestor, JsonFileStore, NumericField, RecordKind, Resolution, Severity, UploadFile,
    export_snapshot,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(filename: &str) -> UploadFile {
    UploadFile::from_path(fixtures_path().join(filename))
}

fn ingest(files: Vec<UploadFile>, state: &AnalyticsState) -> BatchReport {
    Ingestor::new(IngestConfig::default()).ingest(files, state)
}

fn texts(report: &BatchReport) -> Vec<String> {
    report.diagnostics().map(|d| d.text.clone()).collect()
}

// ============================================================================
// Content Scenarios
// ============================================================================

#[test]
fn test_basic_content_export() {
    let state = AnalyticsState::new();
    let report = ingest(vec![fixture("tweets.csv")], &state);

    assert_eq!(
        report.files[0].resolution,
        Resolution::Classified {
            kind: RecordKind::Content
        }
    );
    assert_eq!(report.files[0].row_count, 1);
    assert!(!report.files[0].truncated);

    let rows = state.content_rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.text, "hello");
    assert_eq!(row.impressions, 1000.0);
    assert_eq!(row.likes, NumericField::Present(50.0));
    assert_eq!(row.replies, NumericField::Missing);
    assert_eq!(row.created_at, Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).single());
    assert_eq!(engagement_rate(row), 0.05);
}

#[test]
fn test_messy_headers_resolve() {
    let state = AnalyticsState::new();
    let report = ingest(vec![fixture("messy_content.csv")], &state);

    assert_eq!(
        texts(&report),
        vec![
            "messy_content.csv: Optional columns missing (Likes, Replies, Reposts / Retweets, Bookmarks, Shares, Profile visits). Metrics may be limited.",
            "messy_content.csv: 1 row(s) were dropped because impressions were missing or invalid.",
            "messy_content.csv: 1 row(s) had invalid \"New follows\" values and were treated as missing.",
            "messy_content.csv: Loaded content analytics (3 rows).",
        ]
    );

    let rows = state.content_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id.as_deref(), Some("a1"));
    assert_eq!(rows[0].new_follows, NumericField::Present(16.0));
    assert_eq!(rows[1].text, "second, with comma");
    assert_eq!(rows[1].new_follows, NumericField::Invalid);
    assert_eq!(
        state.snapshot().content_missing_optional,
        vec![
            CanonicalField::Likes,
            CanonicalField::Replies,
            CanonicalField::Reposts,
            CanonicalField::Bookmarks,
            CanonicalField::Shares,
            CanonicalField::ProfileVisits,
        ]
    );
}

#[test]
fn test_in_memory_upload_matches_file_upload() {
    let bytes = std::fs::read(fixtures_path().join("messy_content.csv")).unwrap();

    let from_file = AnalyticsState::new();
    ingest(vec![fixture("messy_content.csv")], &from_file);
    let from_bytes = AnalyticsState::new();
    ingest(
        vec![UploadFile::from_bytes("messy_content.csv", bytes)],
        &from_bytes,
    );

    assert_eq!(from_file.snapshot(), from_bytes.snapshot());
}

// ============================================================================
// Overview Scenarios
// ============================================================================

#[test]
fn test_invalid_calendar_date_dropped() {
    let state = AnalyticsState::new();
    let report = ingest(vec![fixture("overview_bad_dates.csv")], &state);

    assert!(texts(&report).contains(
        &"overview_bad_dates.csv: 1 overview row(s) were dropped due to invalid dates.".to_string()
    ));
    assert!(!report.has_errors());

    let dates: Vec<NaiveDate> = state.overview_rows().iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2025, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
        ]
    );
}

#[test]
fn test_streaks_from_overview_file() {
    let state = AnalyticsState::new();
    let report = ingest(vec![fixture("account_overview.csv")], &state);
    assert_eq!(
        report.files[0].resolution,
        Resolution::Classified {
            kind: RecordKind::Overview
        }
    );

    // Posting pattern Mon..Sun: 1,1,0,1,1,1,0
    let summary = streak_summary(&state.overview_rows());
    assert_eq!(summary.longest_streak, 3);
    assert_eq!(summary.current_streak, 0);
    assert_eq!(summary.active_days, 5);
    assert_eq!(summary.total_days, 7);
    assert_eq!(summary.consistency, 71);
}

#[test]
fn test_viral_day_from_overview_file() {
    let state = AnalyticsState::new();
    ingest(vec![fixture("overview_viral.csv")], &state);

    let report = detect_viral_days(&state.overview_rows());
    assert_eq!(report.median, 100.0);
    assert_eq!(report.threshold, Some(500.0));
    assert_eq!(report.days.len(), 1);
    assert_eq!(report.days[0].row.date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
    assert_eq!(report.days[0].multiplier, 6.0);
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_diagnostics_follow_submission_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let state = AnalyticsState::new();

    let report = Ingestor::new(IngestConfig::default())
        .on_progress(move |update| sink.lock().unwrap().push(update.message))
        .ingest(
            vec![
                fixture("account_overview.csv"),
                fixture("tweets.csv"),
                fixture("overview_viral.csv"),
            ],
            &state,
        );

    let names: Vec<&str> = report.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["account_overview.csv", "tweets.csv", "overview_viral.csv"]);
    assert!(
        seen.lock()
            .unwrap()
            .iter()
            .any(|m| m == "Parsing tweets.csv (2/3)...")
    );

    // A later file of the same kind replaces the earlier one.
    let snapshot = state.snapshot();
    assert_eq!(snapshot.overview_file_name, "overview_viral.csv");
    assert_eq!(snapshot.overview_rows.len(), 5);
    assert_eq!(snapshot.content_file_name, "tweets.csv");
}

#[test]
fn test_reingesting_is_idempotent() {
    let state = AnalyticsState::new();
    let first = ingest(vec![fixture("messy_content.csv")], &state);
    let after_first = state.snapshot();

    let second = ingest(vec![fixture("messy_content.csv")], &state);
    assert_eq!(state.snapshot(), after_first);
    assert_eq!(first, second);
}

#[test]
fn test_rejected_files_leave_state_untouched() {
    let state = AnalyticsState::new();
    ingest(vec![fixture("tweets.csv")], &state);
    let before = state.snapshot();

    let report = ingest(
        vec![UploadFile::from_bytes("notes.csv", b"foo,bar\n1,2\n".to_vec())],
        &state,
    );

    assert!(!report.loaded_any());
    assert_eq!(report.diagnostics().next().unwrap().severity, Severity::Error);
    assert_eq!(state.snapshot(), before);
}

#[test]
fn test_row_limit_truncates() {
    let config = IngestConfig::builder().max_rows_per_file(3).build().unwrap();
    let state = AnalyticsState::new();
    let report = Ingestor::new(config).ingest(vec![fixture("account_overview.csv")], &state);

    let file = &report.files[0];
    assert!(file.truncated);
    assert_eq!(file.row_count, 3);
    assert!(report.has_errors());
    assert_eq!(state.overview_rows().len(), 3);
}

// ============================================================================
// Dashboard, Persistence and Export
// ============================================================================

#[test]
fn test_dashboard_from_fixtures() {
    let state = AnalyticsState::new();
    ingest(
        vec![fixture("messy_content.csv"), fixture("account_overview.csv")],
        &state,
    );

    let dashboard = Dashboard::compute(&state.snapshot(), None);
    assert_eq!(dashboard.heatmap.metric, HeatmapMetric::FollowsPer1k);
    assert_eq!(dashboard.totals.posts, 2);
    assert_eq!(dashboard.totals.impressions, 3072.0);
    assert_eq!(dashboard.top_posts[0].text, "hello world");

    let best = dashboard.heatmap.best_slot().unwrap();
    assert_eq!((best.day, best.hour), (1, 15));

    assert_eq!(dashboard.streaks.longest_streak, 3);
    assert!(dashboard.viral.days.is_empty());
    assert_eq!(dashboard.takeaways.len(), 4);

    let json = serde_json::to_value(&dashboard).unwrap();
    assert!(json.get("heatmap").is_some());
}

#[test]
fn test_snapshot_persists_between_states() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let state = AnalyticsState::with_store(JsonFileStore::new(&path));
    ingest(
        vec![fixture("tweets.csv"), fixture("account_overview.csv")],
        &state,
    );
    assert!(path.exists());

    let restored = AnalyticsState::with_store(JsonFileStore::new(&path));
    assert!(restored.restore().unwrap());
    assert_eq!(restored.snapshot(), state.snapshot());
}

#[test]
fn test_later_session_keeps_stored_overview() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let first = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
    ingest(vec![fixture("account_overview.csv")], &first);

    let second = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
    ingest(vec![fixture("tweets.csv")], &second);

    let reopened = AnalyticsState::open(JsonFileStore::new(&path)).unwrap();
    let snapshot = reopened.snapshot();
    assert_eq!(snapshot.overview_file_name, "account_overview.csv");
    assert_eq!(snapshot.overview_rows.len(), 7);
    assert_eq!(snapshot.content_file_name, "tweets.csv");
    assert_eq!(snapshot.content_rows.len(), 1);
}

#[test]
fn test_exported_content_reimports() {
    let dir = tempfile::tempdir().unwrap();
    let state = AnalyticsState::new();
    ingest(vec![fixture("messy_content.csv")], &state);

    let written = export_snapshot(&state.snapshot(), dir.path()).unwrap();
    assert_eq!(written.len(), 1);

    let reimported = AnalyticsState::new();
    let report = ingest(vec![UploadFile::from_path(&written[0])], &reimported);
    assert_eq!(
        report.files[0].resolution,
        Resolution::Classified {
            kind: RecordKind::Content
        }
    );

    let before = state.content_rows();
    let rows = reimported.content_rows();
    assert_eq!(rows.len(), before.len());
    for (a, b) in rows.iter().zip(&before) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.created_at, b.created_at);
        assert_eq!(a.impressions, b.impressions);
    }
}
