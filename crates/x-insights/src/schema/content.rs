//! Normalization of per-post ("content") exports.

use tracing::debug;

use super::InvalidCounts;
use super::alias::{AliasTable, build_header_map};
use super::coerce::{parse_number, parse_timestamp, to_text};
use crate::tokenizer::RawRow;
use crate::types::{CanonicalField, ContentRow, NormalizationResult, NumericField};

use CanonicalField::*;

pub const CONTENT_ALIASES: AliasTable = &[
    (Id, &["post id", "tweet id", "tweetid", "postid", "id"]),
    (
        Text,
        &["post text", "tweet text", "text", "tweet", "post", "content", "body"],
    ),
    (
        CreatedAt,
        &["created at", "post time", "tweet time", "time", "created", "timestamp", "date"],
    ),
    (Impressions, &["impressions", "impression", "views", "view"]),
    (Likes, &["likes", "like"]),
    (Replies, &["replies", "reply", "comments"]),
    (
        Reposts,
        &["reposts", "repost", "retweets", "retweet", "reposts/retweets", "retweets/reposts"],
    ),
    (Bookmarks, &["bookmarks", "bookmark", "saves", "saved", "save"]),
    (Shares, &["shares", "share"]),
    (
        ProfileVisits,
        &["profile visits", "profile visit", "profile views", "profile view", "profile clicks", "profile click"],
    ),
    (
        NewFollows,
        &["new follows", "new follow", "newfollows", "follows", "followers gained", "follower gains", "follows gained"],
    ),
];

pub const CONTENT_REQUIRED: &[CanonicalField] = &[Text, CreatedAt, Impressions];

pub const CONTENT_OPTIONAL: &[CanonicalField] = &[
    Id,
    Likes,
    Replies,
    Reposts,
    Bookmarks,
    Shares,
    ProfileVisits,
    NewFollows,
];

const CONTENT_NUMERIC: &[CanonicalField] = &[
    Likes,
    Replies,
    Reposts,
    Bookmarks,
    Shares,
    ProfileVisits,
    NewFollows,
];

/// Normalize parsed content rows into [`ContentRow`]s.
///
/// Rows without valid impressions are dropped. Rows whose timestamp cannot be
/// parsed are kept with an empty `created_at` and reported.
pub fn normalize_content(rows: &[RawRow], fields: &[String]) -> NormalizationResult<ContentRow> {
    let header_map = build_header_map(fields, CONTENT_ALIASES);
    let missing_required = header_map.missing(CONTENT_REQUIRED);
    let missing_optional = header_map.missing(CONTENT_OPTIONAL);

    let (Some(text_col), Some(created_col), Some(impressions_col)) = (
        header_map.index(Text),
        header_map.index(CreatedAt),
        header_map.index(Impressions),
    ) else {
        debug!("Content schema unresolved: missing {:?}", missing_required);
        return NormalizationResult {
            rows: Vec::new(),
            missing_required,
            missing_optional,
            warnings: Vec::new(),
        };
    };
    let id_col = header_map.index(Id);

    let mut dropped_for_impressions = 0usize;
    let mut invalid_timestamps = 0usize;
    let mut invalid = InvalidCounts::new(CONTENT_NUMERIC);
    let mut normalized = Vec::with_capacity(rows.len());

    for row in rows {
        let NumericField::Present(impressions) = parse_number(row.cell(impressions_col)) else {
            dropped_for_impressions += 1;
            continue;
        };

        let created_at = parse_timestamp(row.cell(created_col).unwrap_or_default());
        if created_at.is_none() {
            invalid_timestamps += 1;
        }

        normalized.push(ContentRow {
            id: id_col.map(|i| to_text(row.cell(i))),
            text: to_text(row.cell(text_col)),
            created_at,
            impressions,
            likes: invalid.parse(&header_map, row, Likes),
            replies: invalid.parse(&header_map, row, Replies),
            reposts: invalid.parse(&header_map, row, Reposts),
            bookmarks: invalid.parse(&header_map, row, Bookmarks),
            shares: invalid.parse(&header_map, row, Shares),
            profile_visits: invalid.parse(&header_map, row, ProfileVisits),
            new_follows: invalid.parse(&header_map, row, NewFollows),
        });
    }

    let mut warnings = Vec::new();
    if dropped_for_impressions > 0 {
        warnings.push(format!(
            "{dropped_for_impressions} row(s) were dropped because impressions were missing or invalid."
        ));
    }
    if invalid_timestamps > 0 {
        warnings.push(format!(
            "{invalid_timestamps} row(s) have invalid post timestamps and are excluded from time-based charts."
        ));
    }
    warnings.extend(invalid.into_warnings("row(s)"));

    debug!(
        "Normalized {} content rows ({} dropped, {} warnings)",
        normalized.len(),
        dropped_for_impressions,
        warnings.len()
    );

    NormalizationResult {
        rows: normalized,
        missing_required,
        missing_optional,
        warnings,
    }
}
