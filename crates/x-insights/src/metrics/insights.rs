//! The four insight cards and their one-line takeaways.

use serde::{Deserialize, Serialize};

use super::date_label;
use super::engagement::{engagement_count, follows_per_1k};
use super::heatmap::{CountBucket, Heatmap, HeatmapMetric, TimeSlot};
use super::stats::{median, pearson_correlation, percent_change, percentile};
use crate::types::{CanonicalField, ContentRow, OverviewRow};
use crate::utils::{format_count, truncate_text};

const CONVERSION_SERIES_LEN: usize = 6;
const CONVERSION_TEXT_CHARS: usize = 54;
const SCATTER_POINT_LIMIT: usize = 180;
const SCATTER_TEXT_CHARS: usize = 42;
const HIGH_ENGAGEMENT_QUANTILE: f64 = 0.75;
const TREND_WINDOW_DAYS: usize = 30;

const ENGAGEMENT_FIELDS: [CanonicalField; 5] = [
    CanonicalField::Likes,
    CanonicalField::Replies,
    CanonicalField::Reposts,
    CanonicalField::Bookmarks,
    CanonicalField::Shares,
];

/// A card's data, or the reason it cannot be shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Insight<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Insight<T> {
    fn unavailable(reason: &str) -> Self {
        Self::Unavailable {
            reason: reason.to_string(),
        }
    }

    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(card) => Some(card),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

// ============================================================================
// CONVERSION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEntry {
    /// `#1`, `#2`, ...
    pub rank: String,
    /// Follows per 1k impressions, rounded to two decimals
    pub score: f64,
    pub follows: f64,
    pub impressions: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionCard {
    pub posts_count: usize,
    pub top_score: f64,
    pub median_score: f64,
    pub top_series: Vec<ConversionEntry>,
}

fn conversion_card(rows: &[ContentRow], has_follows: bool) -> Insight<ConversionCard> {
    if !has_follows {
        return Insight::unavailable("Missing new follows column.");
    }

    let mut ranked: Vec<(&ContentRow, f64)> = rows
        .iter()
        .filter(|row| row.impressions > 0.0)
        .map(|row| (row, follows_per_1k(row)))
        .collect();
    if ranked.is_empty() {
        return Insight::unavailable("No posts with impressions.");
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let top_series = ranked
        .iter()
        .take(CONVERSION_SERIES_LEN)
        .enumerate()
        .map(|(i, (row, score))| ConversionEntry {
            rank: format!("#{}", i + 1),
            score: (score * 100.0).round() / 100.0,
            follows: row.new_follows.or_zero(),
            impressions: row.impressions,
            text: truncate_text(&row.text, CONVERSION_TEXT_CHARS),
        })
        .collect();

    let scores: Vec<f64> = ranked.iter().map(|(_, score)| *score).collect();
    Insight::Available(ConversionCard {
        posts_count: ranked.len(),
        top_score: scores[0],
        median_score: median(&scores),
        top_series,
    })
}

// ============================================================================
// SCATTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub engagements: f64,
    pub follows: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterCard {
    pub points_count: usize,
    /// Only computed when both engagement and follows columns exist
    pub correlation: Option<f64>,
    pub high_engagement_cutoff: f64,
    pub high_engagement_points: usize,
    /// High-engagement points that brought no follows
    pub zero_follows: usize,
    pub points: Vec<ScatterPoint>,
}

fn scatter_card(rows: &[ContentRow], has_engagement: bool, has_follows: bool) -> Insight<ScatterCard> {
    if !has_engagement && !has_follows {
        return Insight::unavailable("Missing engagement and follows fields.");
    }

    let points: Vec<ScatterPoint> = rows
        .iter()
        .map(|row| ScatterPoint {
            engagements: engagement_count(row),
            follows: row.new_follows.or_zero(),
            text: truncate_text(&row.text, SCATTER_TEXT_CHARS),
        })
        .filter(|p| p.engagements > 0.0 || p.follows > 0.0)
        .take(SCATTER_POINT_LIMIT)
        .collect();
    if points.is_empty() {
        return Insight::unavailable("No measurable engagement/follows points.");
    }

    let engagements: Vec<f64> = points.iter().map(|p| p.engagements).collect();
    let follows: Vec<f64> = points.iter().map(|p| p.follows).collect();
    let correlation = if has_engagement && has_follows {
        pearson_correlation(&engagements, &follows)
    } else {
        None
    };

    let high_engagement_cutoff = percentile(&engagements, HIGH_ENGAGEMENT_QUANTILE);
    let high: Vec<&ScatterPoint> = points
        .iter()
        .filter(|p| p.engagements >= high_engagement_cutoff)
        .collect();
    let zero_follows = high.iter().filter(|p| p.follows == 0.0).count();

    Insight::Available(ScatterCard {
        points_count: points.len(),
        correlation,
        high_engagement_cutoff,
        high_engagement_points: high.len(),
        zero_follows,
        points,
    })
}

// ============================================================================
// TIMING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingCard {
    pub metric: HeatmapMetric,
    pub timed_rows: usize,
    pub best: TimeSlot,
    pub day_series: Vec<CountBucket>,
    pub hour_series: Vec<CountBucket>,
}

fn timing_card(rows: &[ContentRow], metric: HeatmapMetric) -> Insight<TimingCard> {
    let heatmap = Heatmap::build(rows, metric);
    let Some(best) = heatmap.best_slot() else {
        return Insight::unavailable("No valid timestamps.");
    };
    Insight::Available(TimingCard {
        metric,
        timed_rows: heatmap.sampled(),
        best,
        day_series: heatmap.day_series(),
        hour_series: heatmap.hour_series(),
    })
}

// ============================================================================
// TRENDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendIndexPoint {
    pub label: String,
    pub impressions_index: f64,
    pub follows_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsCard {
    pub rows_count: usize,
    /// Percent change of the impressions index, first to last day
    pub impressions_change: Option<f64>,
    pub follows_change: Option<f64>,
    pub series: Vec<TrendIndexPoint>,
}

fn trends_card(rows: &[OverviewRow]) -> Insight<TrendsCard> {
    if rows.is_empty() {
        return Insight::unavailable("Overview CSV not loaded.");
    }

    let mut sorted: Vec<&OverviewRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.date);
    let window = &sorted[sorted.len().saturating_sub(TREND_WINDOW_DAYS)..];

    let impressions_baseline = window
        .iter()
        .map(|row| row.impressions)
        .find(|v| *v > 0.0)
        .unwrap_or(1.0);
    let follows_baseline = window
        .iter()
        .map(|row| row.new_follows.or_zero())
        .find(|v| *v > 0.0)
        .unwrap_or(1.0);

    let series: Vec<TrendIndexPoint> = window
        .iter()
        .map(|row| TrendIndexPoint {
            label: date_label(row.date),
            impressions_index: row.impressions / impressions_baseline * 100.0,
            follows_index: row.new_follows.or_zero() / follows_baseline * 100.0,
        })
        .collect();

    let (impressions_change, follows_change) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (
            percent_change(first.impressions_index, last.impressions_index),
            percent_change(first.follows_index, last.follows_index),
        ),
        _ => (None, None),
    };

    Insight::Available(TrendsCard {
        rows_count: sorted.len(),
        impressions_change,
        follows_change,
        series,
    })
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCard {
    Conversion,
    Scatter,
    Timing,
    Trends,
}

impl InsightCard {
    pub const ALL: [InsightCard; 4] = [Self::Conversion, Self::Scatter, Self::Timing, Self::Trends];

    pub fn title(self) -> &'static str {
        match self {
            Self::Conversion => "Top Follower Efficiency",
            Self::Scatter => "Engagement vs Follows",
            Self::Timing => "Posting Time",
            Self::Trends => "Momentum Index",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub conversion: Insight<ConversionCard>,
    pub scatter: Insight<ScatterCard>,
    pub timing: Insight<TimingCard>,
    pub trends: Insight<TrendsCard>,
}

fn signed_percent(change: Option<f64>) -> String {
    match change {
        Some(value) if value >= 0.0 => format!("+{value:.1}%"),
        Some(value) => format!("{value:.1}%"),
        None => "n/a".to_string(),
    }
}

impl InsightsReport {
    /// Builds every card.
    ///
    /// `content_missing_optional` decides which optional content columns
    /// count as present: a column the file never had is not the same as a
    /// column full of zeros.
    pub fn build(
        content_rows: &[ContentRow],
        overview_rows: &[OverviewRow],
        content_missing_optional: &[CanonicalField],
        metric: HeatmapMetric,
    ) -> Self {
        let has_follows = !content_missing_optional.contains(&CanonicalField::NewFollows);
        let has_engagement = ENGAGEMENT_FIELDS
            .iter()
            .any(|field| !content_missing_optional.contains(field));

        Self {
            conversion: conversion_card(content_rows, has_follows),
            scatter: scatter_card(content_rows, has_engagement, has_follows),
            timing: timing_card(content_rows, metric),
            trends: trends_card(overview_rows),
        }
    }

    /// The one-line summary shown under a card.
    pub fn takeaway(&self, card: InsightCard) -> String {
        match card {
            InsightCard::Conversion => match &self.conversion {
                Insight::Unavailable { reason } => reason.clone(),
                Insight::Available(c) => format!(
                    "Top post converts {:.2} follows/1k. Median is {:.2}.",
                    c.top_score, c.median_score
                ),
            },
            InsightCard::Scatter => match &self.scatter {
                Insight::Unavailable { reason } => reason.clone(),
                Insight::Available(ScatterCard {
                    correlation: None, ..
                }) => "Correlation needs both engagement and follows fields.".to_string(),
                Insight::Available(ScatterCard {
                    correlation: Some(r),
                    ..
                }) => format!("Engagement-to-follows correlation: r {r:.2}."),
            },
            InsightCard::Timing => match &self.timing {
                Insight::Unavailable { reason } => reason.clone(),
                Insight::Available(t) => format!(
                    "Best slot: {} {:02}:00 ({} posts sampled).",
                    t.best.day_label(),
                    t.best.hour,
                    format_count(t.best.posts)
                ),
            },
            InsightCard::Trends => match &self.trends {
                Insight::Unavailable { reason } => reason.clone(),
                Insight::Available(t) => format!(
                    "Recent trend: impressions {}, follows {} (index baseline = 100).",
                    signed_percent(t.impressions_change),
                    signed_percent(t.follows_change)
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericField;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn post(text: &str, impressions: f64, likes: f64, follows: f64) -> ContentRow {
        let mut row = ContentRow::new(
            text,
            Utc.with_ymd_and_hms(2025, 1, 6, 15, 0, 0).single(),
            impressions,
        );
        row.likes = NumericField::Present(likes);
        row.new_follows = NumericField::Present(follows);
        row
    }

    fn overview(day: i64, impressions: f64, follows: f64) -> OverviewRow {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day);
        let mut row = OverviewRow::new(date, impressions);
        row.new_follows = NumericField::Present(follows);
        row
    }

    #[test]
    fn test_conversion_ranking() {
        let rows = vec![
            post("low", 1000.0, 10.0, 1.0),
            post("high", 1000.0, 10.0, 5.0),
            post("", 1000.0, 10.0, 3.0),
            post("no reach", 0.0, 10.0, 9.0),
        ];
        let report = InsightsReport::build(&rows, &[], &[], HeatmapMetric::FollowsPer1k);
        let card = report.conversion.available().unwrap();

        assert_eq!(card.posts_count, 3);
        assert!((card.top_score - 5.0).abs() < 1e-9);
        assert!((card.median_score - 3.0).abs() < 1e-9);
        let ranks: Vec<(&str, &str)> = card
            .top_series
            .iter()
            .map(|e| (e.rank.as_str(), e.text.as_str()))
            .collect();
        assert_eq!(ranks, vec![("#1", "high"), ("#2", "(No text)"), ("#3", "low")]);
        assert_eq!(
            report.takeaway(InsightCard::Conversion),
            "Top post converts 5.00 follows/1k. Median is 3.00."
        );
    }

    #[test]
    fn test_conversion_unavailable() {
        let rows = vec![post("a", 100.0, 1.0, 1.0)];
        let report = InsightsReport::build(
            &rows,
            &[],
            &[CanonicalField::NewFollows],
            HeatmapMetric::Frequency,
        );
        assert_eq!(report.takeaway(InsightCard::Conversion), "Missing new follows column.");

        let report = InsightsReport::build(&[post("a", 0.0, 1.0, 1.0)], &[], &[], HeatmapMetric::Frequency);
        assert_eq!(report.takeaway(InsightCard::Conversion), "No posts with impressions.");
    }

    #[test]
    fn test_scatter_card() {
        let rows = vec![
            post("a", 100.0, 10.0, 1.0),
            post("b", 100.0, 20.0, 2.0),
            post("c", 100.0, 30.0, 3.0),
            post("d", 100.0, 40.0, 0.0),
            post("e", 100.0, 0.0, 0.0),
        ];
        let report = InsightsReport::build(&rows, &[], &[], HeatmapMetric::Frequency);
        let card = report.scatter.available().unwrap();

        assert_eq!(card.points_count, 4);
        assert_eq!(card.high_engagement_cutoff, 30.0);
        assert_eq!(card.high_engagement_points, 2);
        assert_eq!(card.zero_follows, 1);
        assert!(card.correlation.is_some());
        assert!(report.takeaway(InsightCard::Scatter).starts_with("Engagement-to-follows correlation: r "));
    }

    #[test]
    fn test_scatter_without_follows_column() {
        let rows = vec![post("a", 100.0, 10.0, 0.0), post("b", 100.0, 5.0, 0.0)];
        let missing = [CanonicalField::NewFollows];
        let report = InsightsReport::build(&rows, &[], &missing, HeatmapMetric::Frequency);
        assert_eq!(
            report.takeaway(InsightCard::Scatter),
            "Correlation needs both engagement and follows fields."
        );

        let all_missing = [
            CanonicalField::Likes,
            CanonicalField::Replies,
            CanonicalField::Reposts,
            CanonicalField::Bookmarks,
            CanonicalField::Shares,
            CanonicalField::NewFollows,
        ];
        let report = InsightsReport::build(&rows, &[], &all_missing, HeatmapMetric::Frequency);
        assert_eq!(
            report.takeaway(InsightCard::Scatter),
            "Missing engagement and follows fields."
        );

        let report = InsightsReport::build(&[post("z", 1.0, 0.0, 0.0)], &[], &[], HeatmapMetric::Frequency);
        assert_eq!(
            report.takeaway(InsightCard::Scatter),
            "No measurable engagement/follows points."
        );
    }

    #[test]
    fn test_timing_takeaway() {
        let rows = vec![post("a", 100.0, 1.0, 1.0), post("b", 100.0, 1.0, 1.0)];
        let report = InsightsReport::build(&rows, &[], &[], HeatmapMetric::Frequency);
        assert_eq!(
            report.takeaway(InsightCard::Timing),
            "Best slot: Mon 15:00 (2 posts sampled)."
        );

        let undated = vec![ContentRow::new("x", None, 10.0)];
        let report = InsightsReport::build(&undated, &[], &[], HeatmapMetric::Frequency);
        assert_eq!(report.takeaway(InsightCard::Timing), "No valid timestamps.");
    }

    #[test]
    fn test_trends_card() {
        let rows = vec![
            overview(2, 300.0, 0.0),
            overview(0, 0.0, 0.0),
            overview(1, 200.0, 4.0),
        ];
        let report = InsightsReport::build(&[], &rows, &[], HeatmapMetric::Frequency);
        let card = report.trends.available().unwrap();

        assert_eq!(card.rows_count, 3);
        assert_eq!(card.series[0].label, "Jan 1");
        assert_eq!(card.series[1].impressions_index, 100.0);
        assert_eq!(card.series[2].impressions_index, 150.0);
        assert_eq!(card.series[1].follows_index, 100.0);
        // The first day indexes to 0, so the change is undefined.
        assert_eq!(card.impressions_change, None);
        assert_eq!(
            report.takeaway(InsightCard::Trends),
            "Recent trend: impressions n/a, follows n/a (index baseline = 100)."
        );
    }

    #[test]
    fn test_trends_window_and_signs() {
        let rows: Vec<OverviewRow> = (0..40)
            .map(|day| overview(day, if day < 39 { 100.0 } else { 50.0 }, 10.0 + day as f64))
            .collect();
        let report = InsightsReport::build(&[], &rows, &[], HeatmapMetric::Frequency);
        let card = report.trends.available().unwrap();

        assert_eq!(card.rows_count, 40);
        assert_eq!(card.series.len(), 30);
        assert_eq!(card.impressions_change, Some(-50.0));
        assert_eq!(
            report.takeaway(InsightCard::Trends),
            "Recent trend: impressions -50.0%, follows +145.0% (index baseline = 100)."
        );

        let empty = InsightsReport::build(&[], &[], &[], HeatmapMetric::Frequency);
        assert_eq!(empty.takeaway(InsightCard::Trends), "Overview CSV not loaded.");
    }

    #[test]
    fn test_insight_serialization() {
        let insight: Insight<TrendsCard> = Insight::unavailable("Overview CSV not loaded.");
        let json = serde_json::to_string(&insight).unwrap();
        assert_eq!(json, r#"{"status":"unavailable","reason":"Overview CSV not loaded."}"#);
    }
}
