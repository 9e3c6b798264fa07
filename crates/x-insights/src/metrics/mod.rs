//! Metrics engine: pure functions from canonical rows to the aggregates a
//! dashboard renders.
//!
//! # Modules
//!
//! - [`engagement`] - per-post rates and ranking
//! - [`stats`] - mean, median, percentile, correlation
//! - [`heatmap`] - weekday by hour grid
//! - [`streak`] - posting streaks and the consistency calendar
//! - [`viral`] - viral day detection
//! - [`funnel`] - profile visit funnel
//! - [`trends`] - efficiency, follower growth, post frequency, engagement mix
//! - [`insights`] - the four insight cards and their takeaways
//!
//! Nothing here mutates its input or keeps state between calls.
//! [`Dashboard::compute`] runs everything over one [`AnalyticsSnapshot`].

pub mod engagement;
pub mod funnel;
pub mod heatmap;
pub mod insights;
pub mod stats;
pub mod streak;
pub mod trends;
pub mod viral;

pub use engagement::{day_of, engagement_count, engagement_rate, follows_per_1k, hour_of, top_by};
pub use funnel::{ProfileVisitFunnel, profile_visit_funnel};
pub use heatmap::{CountBucket, DAY_LABELS, Heatmap, HeatmapCell, HeatmapMetric, TimeSlot};
pub use insights::{Insight, InsightCard, InsightsReport};
pub use stats::{average, median, pearson_correlation, percent_change, percentile};
pub use streak::{StreakCalendar, StreakSummary, streak_calendar, streak_summary};
pub use trends::{
    EfficiencyTrend, EngagementMix, FollowerGrowth, PostFrequencyGrowth, TrendDirection,
    efficiency_trend, engagement_mix, net_follower_growth, post_frequency_vs_growth,
};
pub use viral::{ViralDay, ViralReport, detect_viral_days};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::state::AnalyticsSnapshot;
use crate::types::{CanonicalField, ContentRow};

/// Rows shown in the top posts table.
pub const TOP_POSTS_LIMIT: usize = 8;

/// Short chart label such as `Jan 6`.
pub(crate) fn date_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Heatmap metric that the loaded columns can support: follows when present,
/// then engagement, then plain posting volume.
pub fn default_heatmap_metric(content_missing_optional: &[CanonicalField]) -> HeatmapMetric {
    let missing = |field: &CanonicalField| content_missing_optional.contains(field);
    if !missing(&CanonicalField::NewFollows) {
        HeatmapMetric::FollowsPer1k
    } else if [
        CanonicalField::Likes,
        CanonicalField::Replies,
        CanonicalField::Reposts,
        CanonicalField::Bookmarks,
        CanonicalField::Shares,
    ]
    .iter()
    .any(|field| !missing(field))
    {
        HeatmapMetric::EngagementRate
    } else {
        HeatmapMetric::Frequency
    }
}

// ============================================================================
// HEADLINE NUMBERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentTotals {
    pub posts: usize,
    pub impressions: f64,
    pub follows: f64,
    /// Highest single-post engagement rate, never below 0
    pub best_engagement_rate: f64,
    /// Highest single-post follows per 1k impressions, never below 0
    pub best_follows_per_1k: f64,
}

pub fn content_totals(rows: &[ContentRow]) -> ContentTotals {
    rows.iter().fold(
        ContentTotals {
            posts: rows.len(),
            ..ContentTotals::default()
        },
        |mut totals, row| {
            totals.impressions += row.impressions;
            totals.follows += row.new_follows.or_zero();
            totals.best_engagement_rate = totals.best_engagement_rate.max(engagement_rate(row));
            totals.best_follows_per_1k = totals.best_follows_per_1k.max(follows_per_1k(row));
            totals
        },
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPost {
    pub id: Option<String>,
    pub text: String,
    pub impressions: f64,
    pub new_follows: f64,
    pub follows_per_1k: f64,
}

/// Posts with impressions, ranked by follows per 1k impressions.
pub fn top_posts(rows: &[ContentRow], count: usize) -> Vec<TopPost> {
    let candidates: Vec<&ContentRow> = rows.iter().filter(|row| row.impressions > 0.0).collect();
    top_by(&candidates, |row| follows_per_1k(row), count)
        .into_iter()
        .map(|row| TopPost {
            id: row.id.clone(),
            text: row.text.clone(),
            impressions: row.impressions,
            new_follows: row.new_follows.or_zero(),
            follows_per_1k: follows_per_1k(row),
        })
        .collect()
}

// ============================================================================
// DASHBOARD
// ============================================================================

/// Every aggregate derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub totals: ContentTotals,
    /// Empty when the content file has no follows column
    pub top_posts: Vec<TopPost>,
    pub heatmap: Heatmap,
    pub insights: InsightsReport,
    pub takeaways: Vec<(InsightCard, String)>,
    pub streaks: StreakSummary,
    pub calendar: StreakCalendar,
    pub viral: ViralReport,
    pub funnel: Option<ProfileVisitFunnel>,
    pub efficiency: Option<EfficiencyTrend>,
    pub follower_growth: FollowerGrowth,
    pub post_frequency: Option<PostFrequencyGrowth>,
    pub engagement_mix: EngagementMix,
}

impl Dashboard {
    /// Computes every aggregate. Without an explicit `metric` the heatmap
    /// uses [`default_heatmap_metric`].
    pub fn compute(snapshot: &AnalyticsSnapshot, metric: Option<HeatmapMetric>) -> Self {
        let content = &snapshot.content_rows;
        let overview = &snapshot.overview_rows;
        let missing = &snapshot.content_missing_optional;
        let metric = metric.unwrap_or_else(|| default_heatmap_metric(missing));

        let insights = InsightsReport::build(content, overview, missing, metric);
        let takeaways = InsightCard::ALL
            .iter()
            .map(|card| (*card, insights.takeaway(*card)))
            .collect();
        let top_posts = if missing.contains(&CanonicalField::NewFollows) {
            Vec::new()
        } else {
            top_posts(content, TOP_POSTS_LIMIT)
        };

        Self {
            totals: content_totals(content),
            top_posts,
            heatmap: Heatmap::build(content, metric),
            insights,
            takeaways,
            streaks: streak_summary(overview),
            calendar: streak_calendar(overview),
            viral: detect_viral_days(overview),
            funnel: profile_visit_funnel(overview),
            efficiency: efficiency_trend(overview),
            follower_growth: net_follower_growth(overview),
            post_frequency: post_frequency_vs_growth(overview),
            engagement_mix: engagement_mix(overview),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AnalyticsState;
    use crate::types::NumericField;

    #[test]
    fn test_date_label() {
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()), "Jan 6");
        assert_eq!(date_label(NaiveDate::from_ymd_opt(2025, 11, 23).unwrap()), "Nov 23");
    }

    #[test]
    fn test_default_heatmap_metric() {
        assert_eq!(default_heatmap_metric(&[]), HeatmapMetric::FollowsPer1k);
        assert_eq!(
            default_heatmap_metric(&[CanonicalField::NewFollows, CanonicalField::Likes]),
            HeatmapMetric::EngagementRate
        );
        assert_eq!(
            default_heatmap_metric(&[
                CanonicalField::NewFollows,
                CanonicalField::Likes,
                CanonicalField::Replies,
                CanonicalField::Reposts,
                CanonicalField::Bookmarks,
                CanonicalField::Shares,
            ]),
            HeatmapMetric::Frequency
        );
    }

    #[test]
    fn test_content_totals() {
        let mut a = ContentRow::new("a", None, 2048.0);
        a.new_follows = NumericField::Present(4.0);
        a.likes = NumericField::Present(256.0);
        let b = ContentRow::new("b", None, 0.0);

        let totals = content_totals(&[a, b]);
        assert_eq!(totals.posts, 2);
        assert_eq!(totals.impressions, 2048.0);
        assert_eq!(totals.follows, 4.0);
        assert_eq!(totals.best_engagement_rate, 0.125);
        assert_eq!(totals.best_follows_per_1k, 1.953125);
        assert_eq!(content_totals(&[]), ContentTotals::default());
    }

    #[test]
    fn test_top_posts_skip_rows_without_reach() {
        let mut viral = ContentRow::new("viral", None, 0.0);
        viral.new_follows = NumericField::Present(50.0);
        let mut good = ContentRow::new("good", None, 1024.0);
        good.new_follows = NumericField::Present(8.0);
        let plain = ContentRow::new("plain", None, 1024.0);

        let top = top_posts(&[plain, viral, good], 8);
        let texts: Vec<&str> = top.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["good", "plain"]);
    }

    #[test]
    fn test_dashboard_over_demo_data() {
        let state = AnalyticsState::new();
        state.load_demo();
        let dashboard = Dashboard::compute(&state.snapshot(), None);

        assert_eq!(dashboard.heatmap.metric, HeatmapMetric::FollowsPer1k);
        assert_eq!(dashboard.totals.posts, 8);
        assert_eq!(dashboard.top_posts.len(), 8);
        assert_eq!(dashboard.takeaways.len(), 4);
        assert!(dashboard.insights.conversion.is_available());
        assert!(dashboard.insights.trends.is_available());
        assert_eq!(dashboard.streaks.total_days, 7);
        assert_eq!(dashboard.streaks.current_streak, 7);
        assert_eq!(dashboard.streaks.consistency, 100);
        assert!(dashboard.viral.days.is_empty());
        assert!(dashboard.funnel.is_some());
        assert!(dashboard.efficiency.is_some());
        assert!(dashboard.follower_growth.has_data);
        assert!(dashboard.post_frequency.is_some());
    }
}
