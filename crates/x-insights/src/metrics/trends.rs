//! Day-by-day series over overview rows.
//!
//! Every function here orders rows by date first; rows sharing a date keep
//! their input order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date_label;
use super::stats::{average, median, pearson_correlation};
use crate::types::OverviewRow;

fn sorted_by_date(rows: &[OverviewRow]) -> Vec<&OverviewRow> {
    let mut sorted: Vec<&OverviewRow> = rows.iter().collect();
    sorted.sort_by_key(|row| row.date);
    sorted
}

// ============================================================================
// ENGAGEMENT EFFICIENCY
// ============================================================================

/// Window of the simple moving average.
pub const SMA_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyPoint {
    pub date: NaiveDate,
    pub label: String,
    /// `engagements / impressions * 100`
    pub efficiency: f64,
    /// Mean efficiency of this and the previous six points
    pub sma7: Option<f64>,
    pub impressions: f64,
    pub engagements: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Improving => "Improving",
            Self::Declining => "Declining",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTrend {
    pub points: Vec<EfficiencyPoint>,
    pub overall_average: f64,
    /// Date and efficiency of the first day with the highest efficiency
    pub best_day: (NaiveDate, f64),
    /// Last seven days against the overall average
    pub direction: TrendDirection,
}

/// Engagement efficiency per day with positive impressions.
///
/// `None` when no day has impressions.
pub fn efficiency_trend(rows: &[OverviewRow]) -> Option<EfficiencyTrend> {
    let mut points: Vec<EfficiencyPoint> = sorted_by_date(rows)
        .into_iter()
        .filter(|row| row.impressions > 0.0)
        .map(|row| {
            let engagements = row.engagements.or_zero();
            EfficiencyPoint {
                date: row.date,
                label: date_label(row.date),
                efficiency: engagements / row.impressions * 100.0,
                sma7: None,
                impressions: row.impressions,
                engagements,
            }
        })
        .collect();

    let first = points.first()?;
    let mut best_day = (first.date, first.efficiency);
    for point in &points {
        if point.efficiency > best_day.1 {
            best_day = (point.date, point.efficiency);
        }
    }

    let efficiencies: Vec<f64> = points.iter().map(|p| p.efficiency).collect();
    for (i, point) in points.iter_mut().enumerate() {
        if i + 1 >= SMA_WINDOW {
            point.sma7 = Some(average(&efficiencies[i + 1 - SMA_WINDOW..=i]));
        }
    }

    let overall_average = average(&efficiencies);
    let recent = &efficiencies[efficiencies.len().saturating_sub(SMA_WINDOW)..];
    let direction = if average(recent) >= overall_average {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };

    Some(EfficiencyTrend {
        points,
        overall_average,
        best_day,
        direction,
    })
}

// ============================================================================
// NET FOLLOWER GROWTH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowerPoint {
    pub date: NaiveDate,
    pub label: String,
    pub follows: f64,
    pub unfollows: f64,
    pub net: f64,
    pub cumulative_net: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FollowerGrowth {
    pub points: Vec<FollowerPoint>,
    pub total_gained: f64,
    pub total_lost: f64,
    pub net_growth: f64,
    /// True when any day recorded follows or unfollows
    pub has_data: bool,
}

pub fn net_follower_growth(rows: &[OverviewRow]) -> FollowerGrowth {
    let mut growth = FollowerGrowth::default();
    let mut cumulative = 0.0;

    for row in sorted_by_date(rows) {
        let follows = row.new_follows.or_zero();
        let unfollows = row.unfollows.or_zero();
        let net = follows - unfollows;
        cumulative += net;
        growth.total_gained += follows;
        growth.total_lost += unfollows;
        if follows > 0.0 || unfollows > 0.0 {
            growth.has_data = true;
        }
        growth.points.push(FollowerPoint {
            date: row.date,
            label: date_label(row.date),
            follows,
            unfollows,
            net,
            cumulative_net: cumulative,
        });
    }

    growth.net_growth = growth.total_gained - growth.total_lost;
    growth
}

// ============================================================================
// POST FREQUENCY VS GROWTH
// ============================================================================

pub const POSITIVE_GROWTH_INSIGHT: &str = "Your data suggests posting more correlates with growth.";
pub const QUALITY_INSIGHT: &str = "More posts doesn't mean more growth for you. Focus on quality.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    pub date: NaiveDate,
    pub label: String,
    pub posts: f64,
    pub follows: f64,
    pub impressions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostFrequencyGrowth {
    pub points: Vec<FrequencyPoint>,
    pub median_posts: f64,
    pub median_follows: f64,
    pub correlation: Option<f64>,
    pub insight: String,
}

/// Posts created against new follows, over days with at least one post.
///
/// `None` when no day recorded a post.
pub fn post_frequency_vs_growth(rows: &[OverviewRow]) -> Option<PostFrequencyGrowth> {
    let points: Vec<FrequencyPoint> = sorted_by_date(rows)
        .into_iter()
        .filter_map(|row| {
            let posts = row.create_post.value().filter(|p| *p > 0.0)?;
            Some(FrequencyPoint {
                date: row.date,
                label: date_label(row.date),
                posts,
                follows: row.new_follows.or_zero(),
                impressions: row.impressions,
            })
        })
        .collect();
    if points.is_empty() {
        return None;
    }

    let posts: Vec<f64> = points.iter().map(|p| p.posts).collect();
    let follows: Vec<f64> = points.iter().map(|p| p.follows).collect();
    let correlation = pearson_correlation(&posts, &follows);
    let insight = if correlation.is_some_and(|r| r > 0.05) {
        POSITIVE_GROWTH_INSIGHT
    } else {
        QUALITY_INSIGHT
    };

    Some(PostFrequencyGrowth {
        median_posts: median(&posts),
        median_follows: median(&follows),
        points,
        correlation,
        insight: insight.to_string(),
    })
}

// ============================================================================
// ENGAGEMENT MIX
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementBreakdown {
    pub likes: f64,
    pub replies: f64,
    pub reposts: f64,
    pub bookmarks: f64,
    pub shares: f64,
}

impl EngagementBreakdown {
    fn from_row(row: &OverviewRow) -> Self {
        Self {
            likes: row.likes.or_zero(),
            replies: row.replies.or_zero(),
            reposts: row.reposts.or_zero(),
            bookmarks: row.bookmarks.or_zero(),
            shares: row.shares.or_zero(),
        }
    }

    fn add(&mut self, other: &Self) {
        self.likes += other.likes;
        self.replies += other.replies;
        self.reposts += other.reposts;
        self.bookmarks += other.bookmarks;
        self.shares += other.shares;
    }

    pub fn total(&self) -> f64 {
        self.likes + self.replies + self.reposts + self.bookmarks + self.shares
    }

    /// Labelled components in display order.
    pub fn components(&self) -> [(&'static str, f64); 5] {
        [
            ("Likes", self.likes),
            ("Replies", self.replies),
            ("Reposts", self.reposts),
            ("Bookmarks", self.bookmarks),
            ("Shares", self.shares),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixPoint {
    pub date: NaiveDate,
    pub label: String,
    #[serde(flatten)]
    pub breakdown: EngagementBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantEngagement {
    pub label: String,
    /// Share of all engagements, in percent
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMix {
    pub points: Vec<MixPoint>,
    pub totals: EngagementBreakdown,
    /// Largest component; the first listed wins ties
    pub dominant: Option<DominantEngagement>,
}

impl EngagementMix {
    pub fn has_data(&self) -> bool {
        self.totals.total() > 0.0
    }
}

pub fn engagement_mix(rows: &[OverviewRow]) -> EngagementMix {
    let mut mix = EngagementMix::default();
    for row in sorted_by_date(rows) {
        let breakdown = EngagementBreakdown::from_row(row);
        mix.totals.add(&breakdown);
        mix.points.push(MixPoint {
            date: row.date,
            label: date_label(row.date),
            breakdown,
        });
    }

    let grand_total = mix.totals.total();
    if grand_total > 0.0 {
        let mut dominant = ("Likes", 0.0);
        for (label, value) in mix.totals.components() {
            if value > dominant.1 {
                dominant = (label, value);
            }
        }
        mix.dominant = Some(DominantEngagement {
            label: dominant.0.to_string(),
            share: dominant.1 / grand_total * 100.0,
        });
    }
    mix
}
