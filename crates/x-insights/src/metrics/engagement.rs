//! Per-post metrics.

use std::cmp::Ordering;

use chrono::{Datelike, Timelike};

use crate::types::ContentRow;

/// Likes, replies, reposts, bookmarks and shares; missing counts read as zero.
pub fn engagement_count(row: &ContentRow) -> f64 {
    row.likes.or_zero()
        + row.replies.or_zero()
        + row.reposts.or_zero()
        + row.bookmarks.or_zero()
        + row.shares.or_zero()
}

/// Engagements per impression. Zero when impressions are not positive.
pub fn engagement_rate(row: &ContentRow) -> f64 {
    if row.impressions <= 0.0 {
        return 0.0;
    }
    engagement_count(row) / row.impressions
}

/// New follows per 1,000 impressions. Zero when impressions are not positive.
pub fn follows_per_1k(row: &ContentRow) -> f64 {
    if row.impressions <= 0.0 {
        return 0.0;
    }
    row.new_follows.or_zero() / row.impressions * 1000.0
}

/// UTC hour of the post (0-23).
pub fn hour_of(row: &ContentRow) -> Option<u32> {
    row.created_at.map(|ts| ts.hour())
}

/// UTC weekday of the post, 0 = Sunday.
pub fn day_of(row: &ContentRow) -> Option<u32> {
    row.created_at.map(|ts| ts.weekday().num_days_from_sunday())
}

/// The `count` rows scoring highest under `metric`.
///
/// The sort is stable: rows with equal scores keep their input order.
pub fn top_by<T, F>(rows: &[T], metric: F, count: usize) -> Vec<&T>
where
    F: Fn(&T) -> f64,
{
    let mut scored: Vec<(&T, f64)> = rows.iter().map(|row| (row, metric(row))).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().take(count).map(|(row, _)| row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericField;
    use chrono::{TimeZone, Utc};

    fn post(impressions: f64, likes: f64, follows: f64) -> ContentRow {
        let mut row = ContentRow::new("post", None, impressions);
        row.likes = NumericField::Present(likes);
        row.new_follows = NumericField::Present(follows);
        row
    }

    #[test]
    fn test_engagement_count_treats_missing_as_zero() {
        let mut row = post(100.0, 4.0, 0.0);
        row.replies = NumericField::Invalid;
        row.shares = NumericField::Present(2.5);
        assert_eq!(engagement_count(&row), 6.5);
    }

    #[test]
    fn test_rates_guard_non_positive_impressions() {
        for impressions in [0.0, -10.0] {
            let row = post(impressions, 10.0, 3.0);
            assert_eq!(engagement_rate(&row), 0.0);
            assert_eq!(follows_per_1k(&row), 0.0);
        }

        let row = post(2048.0, 128.0, 5.0);
        assert_eq!(engagement_rate(&row), 0.0625);
        assert_eq!(follows_per_1k(&row), 2.44140625);
    }

    #[test]
    fn test_hour_and_day_are_utc() {
        // 2025-01-05 is a Sunday
        let row = ContentRow::new("t", Utc.with_ymd_and_hms(2025, 1, 5, 23, 30, 0).single(), 1.0);
        assert_eq!(hour_of(&row), Some(23));
        assert_eq!(day_of(&row), Some(0));

        let undated = ContentRow::new("t", None, 1.0);
        assert_eq!(hour_of(&undated), None);
        assert_eq!(day_of(&undated), None);
    }

    #[test]
    fn test_top_by_is_stable() {
        let rows = vec![("a", 1.0), ("b", 3.0), ("c", 1.0), ("d", 3.0), ("e", 2.0)];
        let top: Vec<&str> = top_by(&rows, |r| r.1, 4).into_iter().map(|r| r.0).collect();
        assert_eq!(top, vec!["b", "d", "e", "a"]);
    }

    #[test]
    fn test_top_by_count_larger_than_input() {
        let rows = vec![1.0, 2.0];
        assert_eq!(top_by(&rows, |v| *v, 10).len(), 2);
        assert!(top_by(&rows, |v| *v, 0).is_empty());
    }
}
