//! Day-of-week by hour-of-day posting heatmap.

use serde::{Deserialize, Serialize};

use super::engagement::{day_of, engagement_rate, follows_per_1k, hour_of};
use crate::types::ContentRow;

pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// What a heatmap cell measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeatmapMetric {
    #[default]
    FollowsPer1k,
    EngagementRate,
    /// Number of posts in the slot
    Frequency,
}

impl HeatmapMetric {
    pub fn label(self) -> &'static str {
        match self {
            Self::FollowsPer1k => "Follows per 1k impressions",
            Self::EngagementRate => "Engagement rate",
            Self::Frequency => "Posting volume",
        }
    }

    fn sample(self, row: &ContentRow) -> f64 {
        match self {
            Self::FollowsPer1k => follows_per_1k(row),
            Self::EngagementRate => engagement_rate(row),
            Self::Frequency => 1.0,
        }
    }

    /// Display form of a cell value.
    pub fn format_value(self, value: f64) -> String {
        match self {
            Self::Frequency => format!("{}", value.round()),
            Self::EngagementRate => format!("{:.2}%", value * 100.0),
            Self::FollowsPer1k => format!("{value:.2}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub count: usize,
    pub sum: f64,
}

impl HeatmapCell {
    /// Post count for `Frequency`, otherwise the mean sample. 0 when empty.
    pub fn value(&self, metric: HeatmapMetric) -> f64 {
        match metric {
            HeatmapMetric::Frequency => self.count as f64,
            _ if self.count == 0 => 0.0,
            _ => self.sum / self.count as f64,
        }
    }
}

/// The highest-valued populated cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// 0 = Sunday
    pub day: u32,
    pub hour: u32,
    pub value: f64,
    pub posts: usize,
}

impl TimeSlot {
    pub fn day_label(&self) -> &'static str {
        DAY_LABELS[self.day as usize % 7]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountBucket {
    pub label: String,
    pub count: usize,
}

/// Posts bucketed by UTC weekday and hour.
///
/// Rows without a timestamp are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub metric: HeatmapMetric,
    pub cells: [[HeatmapCell; 24]; 7],
}

impl Heatmap {
    pub fn build(rows: &[ContentRow], metric: HeatmapMetric) -> Self {
        let mut cells = [[HeatmapCell::default(); 24]; 7];
        for row in rows {
            let (Some(day), Some(hour)) = (day_of(row), hour_of(row)) else {
                continue;
            };
            let cell = &mut cells[day as usize][hour as usize];
            cell.count += 1;
            cell.sum += metric.sample(row);
        }
        Self { metric, cells }
    }

    pub fn value(&self, day: usize, hour: usize) -> f64 {
        self.cells[day][hour].value(self.metric)
    }

    /// Number of rows that landed in a cell.
    pub fn sampled(&self) -> usize {
        self.cells.iter().flatten().map(|c| c.count).sum()
    }

    /// Largest cell value, 0 when nothing is populated.
    pub fn max_value(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .map(|c| c.value(self.metric))
            .fold(0.0, f64::max)
    }

    /// First populated cell (day-major, hour-minor) with the highest value.
    pub fn best_slot(&self) -> Option<TimeSlot> {
        let mut best: Option<TimeSlot> = None;
        for (day, hours) in self.cells.iter().enumerate() {
            for (hour, cell) in hours.iter().enumerate() {
                if cell.count == 0 {
                    continue;
                }
                let value = cell.value(self.metric);
                if best.is_none_or(|b| value > b.value) {
                    best = Some(TimeSlot {
                        day: day as u32,
                        hour: hour as u32,
                        value,
                        posts: cell.count,
                    });
                }
            }
        }
        best
    }

    /// Posts per weekday, Sunday first.
    pub fn day_series(&self) -> Vec<CountBucket> {
        DAY_LABELS
            .iter()
            .zip(&self.cells)
            .map(|(label, hours)| CountBucket {
                label: (*label).to_string(),
                count: hours.iter().map(|c| c.count).sum(),
            })
            .collect()
    }

    /// Posts per hour, labelled `00` to `23`.
    pub fn hour_series(&self) -> Vec<CountBucket> {
        (0..24)
            .map(|hour| CountBucket {
                label: format!("{hour:02}"),
                count: self.cells.iter().map(|hours| hours[hour].count).sum(),
            })
            .collect()
    }
}
