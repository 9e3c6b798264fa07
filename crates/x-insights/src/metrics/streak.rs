//! Posting streaks and the consistency calendar.
//!
//! A day is active when its summed `createPost` count is at least one. The
//! observed range runs from the earliest to the latest overview date,
//! inclusive; days inside the range without a row count as inactive.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::OverviewRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct DayTotals {
    posts: f64,
    follows: f64,
}

fn totals_by_date(rows: &[OverviewRow]) -> BTreeMap<NaiveDate, DayTotals> {
    let mut by_date: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for row in rows {
        let totals = by_date.entry(row.date).or_default();
        totals.posts += row.create_post.or_zero();
        totals.follows += row.new_follows.or_zero();
    }
    by_date
}

fn days_between(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    first.iter_days().take_while(move |d| *d <= last)
}

// ============================================================================
// STREAKS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakSummary {
    /// Consecutive active days ending on the last observed date
    pub current_streak: usize,
    pub longest_streak: usize,
    pub active_days: usize,
    pub total_days: usize,
    /// `round(active_days / total_days * 100)`
    pub consistency: u32,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn streak_summary(rows: &[OverviewRow]) -> StreakSummary {
    let by_date = totals_by_date(rows);
    let (Some(first), Some(last)) = (
        by_date.keys().next().copied(),
        by_date.keys().next_back().copied(),
    ) else {
        return StreakSummary::default();
    };

    let active: Vec<bool> = days_between(first, last)
        .map(|date| by_date.get(&date).is_some_and(|t| t.posts >= 1.0))
        .collect();

    let current_streak = active.iter().rev().take_while(|a| **a).count();

    let mut longest_streak = 0;
    let mut run = 0;
    for is_active in &active {
        if *is_active {
            run += 1;
            longest_streak = longest_streak.max(run);
        } else {
            run = 0;
        }
    }

    let active_days = active.iter().filter(|a| **a).count();
    let total_days = active.len();
    let consistency = if total_days > 0 {
        (active_days as f64 / total_days as f64 * 100.0).round() as u32
    } else {
        0
    };

    StreakSummary {
        current_streak,
        longest_streak,
        active_days,
        total_days,
        consistency,
        first_date: Some(first),
        last_date: Some(last),
    }
}

// ============================================================================
// CALENDAR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub posts: f64,
    pub follows: f64,
    /// 0 = Sunday
    pub day_of_week: u32,
    /// False for the padding days outside the observed range
    pub in_range: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthLabel {
    pub label: String,
    /// Index of the week column the label sits above
    pub week: usize,
}

/// Sunday-to-Saturday weeks covering the observed range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakCalendar {
    pub weeks: Vec<Vec<CalendarDay>>,
    pub month_labels: Vec<MonthLabel>,
}

pub fn streak_calendar(rows: &[OverviewRow]) -> StreakCalendar {
    let by_date = totals_by_date(rows);
    let (Some(first), Some(last)) = (
        by_date.keys().next().copied(),
        by_date.keys().next_back().copied(),
    ) else {
        return StreakCalendar::default();
    };

    let start = first - Duration::days(i64::from(first.weekday().num_days_from_sunday()));
    let end = last + Duration::days(i64::from(6 - last.weekday().num_days_from_sunday()));

    let days: Vec<CalendarDay> = days_between(start, end)
        .map(|date| {
            let totals = by_date.get(&date).copied().unwrap_or_default();
            CalendarDay {
                date,
                posts: totals.posts,
                follows: totals.follows,
                day_of_week: date.weekday().num_days_from_sunday(),
                in_range: date >= first && date <= last,
            }
        })
        .collect();

    let weeks: Vec<Vec<CalendarDay>> = days.chunks(7).map(<[CalendarDay]>::to_vec).collect();

    let mut month_labels = Vec::new();
    let mut previous_month = None;
    for (week, days) in weeks.iter().enumerate() {
        let Some(sunday) = days.first() else {
            continue;
        };
        let month = sunday.date.month();
        if previous_month != Some(month) {
            month_labels.push(MonthLabel {
                label: sunday.date.format("%b").to_string(),
                week,
            });
            previous_month = Some(month);
        }
    }

    StreakCalendar {
        weeks,
        month_labels,
    }
}
