//! Normalization of daily account ("overview") exports.

use tracing::debug;

use super::InvalidCounts;
use super::alias::{AliasTable, build_header_map};
use super::coerce::{parse_number, to_date_key};
use crate::tokenizer::RawRow;
use crate::types::{CanonicalField, NormalizationResult, NumericField, OverviewRow};

use CanonicalField::*;

pub const OVERVIEW_ALIASES: AliasTable = &[
    (Date, &["date", "day"]),
    (Impressions, &["impressions", "impression", "views", "view"]),
    (Engagements, &["engagements", "engagement"]),
    (
        ProfileVisits,
        &["profile visits", "profile visit", "profile views", "profile view", "profile clicks", "profile click"],
    ),
    (
        NewFollows,
        &["new follows", "new follow", "newfollows", "follows", "followers gained", "follower gains", "follows gained"],
    ),
    (Likes, &["likes", "like"]),
    (Bookmarks, &["bookmarks", "bookmark"]),
    (Shares, &["shares", "share"]),
    (Unfollows, &["unfollows", "unfollow", "followers lost"]),
    (Replies, &["replies", "reply"]),
    (Reposts, &["reposts", "repost", "retweets", "retweet"]),
    (
        CreatePost,
        &["create post", "posts created", "tweets", "posts", "post count"],
    ),
    (VideoViews, &["video views", "video view"]),
    (MediaViews, &["media views", "media view", "media engagements"]),
];

pub const OVERVIEW_REQUIRED: &[CanonicalField] = &[Date, Impressions];

pub const OVERVIEW_OPTIONAL: &[CanonicalField] = &[
    Engagements,
    ProfileVisits,
    NewFollows,
    Likes,
    Bookmarks,
    Shares,
    Unfollows,
    Replies,
    Reposts,
    CreatePost,
    VideoViews,
    MediaViews,
];

/// Normalize parsed overview rows into [`OverviewRow`]s.
///
/// Rows with an unparsable date are dropped first, then rows without valid
/// impressions. Duplicate dates are kept as separate rows.
pub fn normalize_overview(rows: &[RawRow], fields: &[String]) -> NormalizationResult<OverviewRow> {
    let header_map = build_header_map(fields, OVERVIEW_ALIASES);
    let missing_required = header_map.missing(OVERVIEW_REQUIRED);
    let missing_optional = header_map.missing(OVERVIEW_OPTIONAL);

    let (Some(date_col), Some(impressions_col)) =
        (header_map.index(Date), header_map.index(Impressions))
    else {
        debug!("Overview schema unresolved: missing {:?}", missing_required);
        return NormalizationResult {
            rows: Vec::new(),
            missing_required,
            missing_optional,
            warnings: Vec::new(),
        };
    };

    let mut dropped_for_date = 0usize;
    let mut dropped_for_impressions = 0usize;
    let mut invalid = InvalidCounts::new(OVERVIEW_OPTIONAL);
    let mut normalized = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(date) = to_date_key(row.cell(date_col).unwrap_or_default()) else {
            dropped_for_date += 1;
            continue;
        };

        let NumericField::Present(impressions) = parse_number(row.cell(impressions_col)) else {
            dropped_for_impressions += 1;
            continue;
        };

        normalized.push(OverviewRow {
            date,
            impressions,
            engagements: invalid.parse(&header_map, row, Engagements),
            profile_visits: invalid.parse(&header_map, row, ProfileVisits),
            new_follows: invalid.parse(&header_map, row, NewFollows),
            likes: invalid.parse(&header_map, row, Likes),
            bookmarks: invalid.parse(&header_map, row, Bookmarks),
            shares: invalid.parse(&header_map, row, Shares),
            unfollows: invalid.parse(&header_map, row, Unfollows),
            replies: invalid.parse(&header_map, row, Replies),
            reposts: invalid.parse(&header_map, row, Reposts),
            create_post: invalid.parse(&header_map, row, CreatePost),
            video_views: invalid.parse(&header_map, row, VideoViews),
            media_views: invalid.parse(&header_map, row, MediaViews),
        });
    }

    let mut warnings = Vec::new();
    if dropped_for_date > 0 {
        warnings.push(format!(
            "{dropped_for_date} overview row(s) were dropped due to invalid dates."
        ));
    }
    if dropped_for_impressions > 0 {
        warnings.push(format!(
            "{dropped_for_impressions} overview row(s) were dropped because impressions were missing or invalid."
        ));
    }
    warnings.extend(invalid.into_warnings("overview row(s)"));

    debug!(
        "Normalized {} overview rows ({} dropped)",
        normalized.len(),
        dropped_for_date + dropped_for_impressions
    );

    NormalizationResult {
        rows: normalized,
        missing_required,
        missing_optional,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CsvTokenizer;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn normalize(csv: &str) -> NormalizationResult<OverviewRow> {
        let parsed = CsvTokenizer::new().parse_bytes(csv.as_bytes());
        normalize_overview(&parsed.rows, &parsed.fields)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_export() {
        let result = normalize(
            "Date,Impressions,Likes,Engagements,Bookmarks,Shares,New follows,Unfollows,Replies,Reposts,Profile visits,Create Post,Video views,Media Views\n\
             \"Mon, Feb 03, 2025\",1200,30,80,4,2,6,1,5,3,20,2,0,15\n",
        );

        assert!(result.missing_required.is_empty());
        assert!(result.missing_optional.is_empty());
        assert!(result.warnings.is_empty());

        let row = &result.rows[0];
        assert_eq!(row.date, day(2025, 2, 3));
        assert_eq!(row.impressions, 1200.0);
        assert_eq!(row.engagements, NumericField::Present(80.0));
        assert_eq!(row.new_follows, NumericField::Present(6.0));
        assert_eq!(row.unfollows, NumericField::Present(1.0));
        assert_eq!(row.create_post, NumericField::Present(2.0));
        assert_eq!(row.media_views, NumericField::Present(15.0));
    }

    #[test]
    fn test_impossible_date_dropped() {
        let result = normalize("date,impressions\n2025-02-30,100\n2025-02-28,50\n");

        assert!(result.missing_required.is_empty());
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].date, day(2025, 2, 28));
        assert_eq!(
            result.warnings,
            vec!["1 overview row(s) were dropped due to invalid dates.".to_string()]
        );
    }

    #[test]
    fn test_date_checked_before_impressions() {
        let result = normalize("day,views,posts\nbad,,1\n2025-01-02,,1\n2025-01-03,9,oops\n");

        assert_eq!(result.rows.len(), 1);
        assert_eq!(
            result.warnings,
            vec![
                "1 overview row(s) were dropped due to invalid dates.".to_string(),
                "1 overview row(s) were dropped because impressions were missing or invalid."
                    .to_string(),
                "1 overview row(s) had invalid \"Posts created\" values and were treated as missing."
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_required() {
        let result = normalize("impressions,likes\n1,2\n");
        assert_eq!(result.missing_required, vec![Date]);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_duplicate_dates_are_kept() {
        let result = normalize("date,impressions\n2025-01-01,1\n2025-01-01,2\n");
        assert_eq!(result.rows.len(), 2);
    }
}
