//! Fixed sample dataset used by demo mode.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::types::{ContentRow, NumericField, OverviewRow};

pub const DEMO_CONTENT_FILE_NAME: &str = "demo_content.csv";
pub const DEMO_OVERVIEW_FILE_NAME: &str = "demo_overview.csv";

// (text, day of January 2025, hour UTC, impressions,
//  likes, replies, reposts, bookmarks, shares, profile visits, new follows)
type ContentSeed = (&'static str, u32, u32, f64, [f64; 7]);

const CONTENT_SEEDS: &[ContentSeed] = &[
    (
        "Shipped a new onboarding flow in 48 hours. Here are the lessons.",
        6,
        15,
        12450.0,
        [420.0, 36.0, 58.0, 24.0, 10.0, 310.0, 64.0],
    ),
    (
        "Stop chasing engagement. Optimize for distribution instead.",
        7,
        19,
        18200.0,
        [530.0, 44.0, 90.0, 40.0, 18.0, 410.0, 92.0],
    ),
    (
        "3 pricing mistakes I see founders make every week:",
        8,
        13,
        7600.0,
        [210.0, 19.0, 28.0, 14.0, 6.0, 150.0, 27.0],
    ),
    (
        "A 5-minute teardown of a viral landing page. (Thread)",
        9,
        22,
        24800.0,
        [760.0, 62.0, 140.0, 68.0, 22.0, 540.0, 128.0],
    ),
    (
        "Hot take: you only need 3 metrics to steer product growth.",
        10,
        10,
        9800.0,
        [300.0, 22.0, 36.0, 18.0, 8.0, 210.0, 39.0],
    ),
    (
        "I tested 12 headlines so you don't have to. Winner inside.",
        11,
        16,
        15400.0,
        [470.0, 33.0, 70.0, 30.0, 12.0, 360.0, 81.0],
    ),
    (
        "The fastest way to tank your engagement rate? Post at 3am.",
        12,
        3,
        4600.0,
        [140.0, 10.0, 16.0, 8.0, 3.0, 90.0, 12.0],
    ),
    (
        "Built a weekly analytics ritual: what I track, what I ignore.",
        12,
        18,
        11200.0,
        [350.0, 26.0, 44.0, 20.0, 9.0, 260.0, 52.0],
    ),
];

// (day of January 2025, impressions, engagements, profile visits, new follows)
const OVERVIEW_SEEDS: &[(u32, f64, f64, f64, f64)] = &[
    (6, 26500.0, 930.0, 520.0, 120.0),
    (7, 31200.0, 1240.0, 610.0, 165.0),
    (8, 21800.0, 760.0, 430.0, 98.0),
    (9, 34800.0, 1520.0, 720.0, 190.0),
    (10, 28900.0, 940.0, 580.0, 132.0),
    (11, 30100.0, 1100.0, 640.0, 150.0),
    (12, 27400.0, 980.0, 560.0, 142.0),
];

/// The demo posts.
pub fn demo_content_rows() -> Vec<ContentRow> {
    CONTENT_SEEDS
        .iter()
        .enumerate()
        .map(|(i, (text, day, hour, impressions, counts))| {
            let [likes, replies, reposts, bookmarks, shares, visits, follows] =
                counts.map(NumericField::Present);
            ContentRow {
                id: Some((i + 1).to_string()),
                text: (*text).to_string(),
                created_at: Utc.with_ymd_and_hms(2025, 1, *day, *hour, 0, 0).single(),
                impressions: *impressions,
                likes,
                replies,
                reposts,
                bookmarks,
                shares,
                profile_visits: visits,
                new_follows: follows,
            }
        })
        .collect()
}

/// The demo daily rollups. Post counts per day match the demo posts.
pub fn demo_overview_rows() -> Vec<OverviewRow> {
    OVERVIEW_SEEDS
        .iter()
        .filter_map(|(day, impressions, engagements, visits, follows)| {
            let date = NaiveDate::from_ymd_opt(2025, 1, *day)?;
            let posts = CONTENT_SEEDS.iter().filter(|seed| seed.1 == *day).count();

            let mut row = OverviewRow::new(date, *impressions);
            row.engagements = NumericField::Present(*engagements);
            row.profile_visits = NumericField::Present(*visits);
            row.new_follows = NumericField::Present(*follows);
            row.create_post = NumericField::Present(posts as f64);
            Some(row)
        })
        .collect()
}
