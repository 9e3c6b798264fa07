//! Impressions to profile visits to new follows.

use serde::{Deserialize, Serialize};

use crate::types::OverviewRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileVisitFunnel {
    pub impressions: f64,
    pub profile_visits: f64,
    pub new_follows: f64,
    /// Percent of impressions that became a profile visit
    pub impression_to_visit_rate: f64,
    /// Percent of profile visits that became a follow; 0 without visits
    pub visit_to_follow_rate: f64,
    pub visits_per_1k: f64,
    pub follows_per_1k: f64,
}

/// Totals and conversion rates over all overview rows.
///
/// `None` when there are no rows or total impressions are zero.
pub fn profile_visit_funnel(rows: &[OverviewRow]) -> Option<ProfileVisitFunnel> {
    if rows.is_empty() {
        return None;
    }

    let (impressions, profile_visits, new_follows) =
        rows.iter().fold((0.0, 0.0, 0.0), |(i, v, f), row| {
            (
                i + row.impressions,
                v + row.profile_visits.or_zero(),
                f + row.new_follows.or_zero(),
            )
        });
    if impressions == 0.0 {
        return None;
    }

    let visit_to_follow_rate = if profile_visits > 0.0 {
        new_follows / profile_visits * 100.0
    } else {
        0.0
    };

    Some(ProfileVisitFunnel {
        impressions,
        profile_visits,
        new_follows,
        impression_to_visit_rate: profile_visits / impressions * 100.0,
        visit_to_follow_rate,
        visits_per_1k: profile_visits / impressions * 1000.0,
        follows_per_1k: new_follows / impressions * 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumericField;
    use chrono::NaiveDate;

    fn row(day: u32, impressions: f64, visits: NumericField, follows: NumericField) -> OverviewRow {
        let mut row = OverviewRow::new(NaiveDate::from_ymd_opt(2025, 1, day).unwrap(), impressions);
        row.profile_visits = visits;
        row.new_follows = follows;
        row
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_funnel_rates() {
        let rows = vec![
            row(1, 6000.0, NumericField::Present(60.0), NumericField::Present(6.0)),
            row(2, 4000.0, NumericField::Present(40.0), NumericField::Missing),
        ];
        let funnel = profile_visit_funnel(&rows).unwrap();

        assert_eq!(funnel.impressions, 10000.0);
        assert_eq!(funnel.profile_visits, 100.0);
        assert_eq!(funnel.new_follows, 6.0);
        assert_close(funnel.impression_to_visit_rate, 1.0);
        assert_close(funnel.visit_to_follow_rate, 6.0);
        assert_close(funnel.visits_per_1k, 10.0);
        assert_close(funnel.follows_per_1k, 0.6);
    }

    #[test]
    fn test_funnel_without_visits() {
        let rows = vec![row(1, 500.0, NumericField::Missing, NumericField::Present(5.0))];
        let funnel = profile_visit_funnel(&rows).unwrap();
        assert_eq!(funnel.visit_to_follow_rate, 0.0);
        assert_close(funnel.follows_per_1k, 10.0);
    }

    #[test]
    fn test_funnel_unavailable() {
        assert!(profile_visit_funnel(&[]).is_none());
        let rows = vec![row(1, 0.0, NumericField::Present(3.0), NumericField::Missing)];
        assert!(profile_visit_funnel(&rows).is_none());
    }
}
