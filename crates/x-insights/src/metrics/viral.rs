//! Viral day detection: days far above the typical daily reach.

use serde::{Deserialize, Serialize};

use super::stats::median;
use crate::types::OverviewRow;

/// A day counts as viral at this multiple of the median daily impressions.
pub const VIRAL_MULTIPLE: f64 = 5.0;

/// Number of viral days reported.
pub const MAX_VIRAL_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViralDay {
    pub row: OverviewRow,
    /// `round(impressions / median)`
    pub multiplier: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViralReport {
    pub median: f64,
    /// `None` when the median is zero; no day can qualify then.
    pub threshold: Option<f64>,
    /// Highest-impression days first.
    pub days: Vec<ViralDay>,
    /// Impressions of the top viral day, 0 without viral days.
    pub max_impressions: f64,
}

/// Flags days whose impressions reach five times the median.
///
/// Rows with negative impressions are ignored.
pub fn detect_viral_days(rows: &[OverviewRow]) -> ViralReport {
    let valid: Vec<&OverviewRow> = rows.iter().filter(|r| r.impressions >= 0.0).collect();
    if valid.is_empty() {
        return ViralReport::default();
    }

    let impressions: Vec<f64> = valid.iter().map(|r| r.impressions).collect();
    let median = median(&impressions);
    let threshold = (median > 0.0).then_some(median * VIRAL_MULTIPLE);

    let mut days: Vec<ViralDay> = match threshold {
        Some(threshold) => valid
            .into_iter()
            .filter(|r| r.impressions >= threshold)
            .map(|r| ViralDay {
                row: r.clone(),
                multiplier: (r.impressions / median).round(),
            })
            .collect(),
        None => Vec::new(),
    };
    days.sort_by(|a, b| b.row.impressions.total_cmp(&a.row.impressions));
    days.truncate(MAX_VIRAL_DAYS);

    let max_impressions = days.first().map_or(0.0, |d| d.row.impressions);

    ViralReport {
        median,
        threshold,
        days,
        max_impressions,
    }
}
