//! Canonical record types shared by the normalizers, the metrics engine and
//! the application state.
//!
//! Row types serialize with camelCase field names; this is the wire contract
//! consumed by dashboards and persisted snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Three-valued numerics
// ============================================================================

/// Result of coercing one optional numeric cell.
///
/// `Missing` means no value was supplied; `Invalid` means a value was supplied
/// but could not be read as a finite number. Both read as "no value" for
/// aggregation, but only `Invalid` is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NumericField {
    Present(f64),
    #[default]
    Missing,
    Invalid,
}

impl NumericField {
    /// The parsed value, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing | Self::Invalid => None,
        }
    }

    /// The parsed value, with missing and invalid cells read as zero.
    pub fn or_zero(self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl From<Option<f64>> for NumericField {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Present)
    }
}

/// Serialized as a number, or `null` when missing or invalid.
impl Serialize for NumericField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Present(v) => serializer.serialize_f64(*v),
            Self::Missing | Self::Invalid => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for NumericField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// Canonical vocabulary
// ============================================================================

/// The fixed internal names CSV columns are mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Id,
    Text,
    CreatedAt,
    Impressions,
    Likes,
    Replies,
    Reposts,
    Bookmarks,
    Shares,
    ProfileVisits,
    NewFollows,
    Date,
    Engagements,
    Unfollows,
    CreatePost,
    VideoViews,
    MediaViews,
}

impl CanonicalField {
    /// The camelCase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Text => "text",
            Self::CreatedAt => "createdAt",
            Self::Impressions => "impressions",
            Self::Likes => "likes",
            Self::Replies => "replies",
            Self::Reposts => "reposts",
            Self::Bookmarks => "bookmarks",
            Self::Shares => "shares",
            Self::ProfileVisits => "profileVisits",
            Self::NewFollows => "newFollows",
            Self::Date => "date",
            Self::Engagements => "engagements",
            Self::Unfollows => "unfollows",
            Self::CreatePost => "createPost",
            Self::VideoViews => "videoViews",
            Self::MediaViews => "mediaViews",
        }
    }

    /// User-facing label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "Post ID",
            Self::Text => "Post/Tweet text",
            Self::CreatedAt => "Created at / Post time",
            Self::Impressions => "Impressions",
            Self::Likes => "Likes",
            Self::Replies => "Replies",
            Self::Reposts => "Reposts / Retweets",
            Self::Bookmarks => "Bookmarks",
            Self::Shares => "Shares",
            Self::ProfileVisits => "Profile visits",
            Self::NewFollows => "New follows",
            Self::Date => "Date",
            Self::Engagements => "Engagements",
            Self::Unfollows => "Unfollows",
            Self::CreatePost => "Posts created",
            Self::VideoViews => "Video views",
            Self::MediaViews => "Media views",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join the labels of `fields` with `", "` for diagnostics.
pub fn join_labels(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Canonical rows
// ============================================================================

/// One post's performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    /// `None` when the source timestamp could not be parsed.
    #[serde(with = "iso_instant")]
    pub created_at: Option<DateTime<Utc>>,
    pub impressions: f64,
    #[serde(default)]
    pub likes: NumericField,
    #[serde(default)]
    pub replies: NumericField,
    #[serde(default)]
    pub reposts: NumericField,
    #[serde(default)]
    pub bookmarks: NumericField,
    #[serde(default)]
    pub shares: NumericField,
    #[serde(default)]
    pub profile_visits: NumericField,
    #[serde(default)]
    pub new_follows: NumericField,
}

impl ContentRow {
    /// A row with only the required fields set.
    pub fn new(text: impl Into<String>, created_at: Option<DateTime<Utc>>, impressions: f64) -> Self {
        Self {
            id: None,
            text: text.into(),
            created_at,
            impressions,
            likes: NumericField::Missing,
            replies: NumericField::Missing,
            reposts: NumericField::Missing,
            bookmarks: NumericField::Missing,
            shares: NumericField::Missing,
            profile_visits: NumericField::Missing,
            new_follows: NumericField::Missing,
        }
    }
}

/// One calendar day's account rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRow {
    pub date: NaiveDate,
    pub impressions: f64,
    #[serde(default)]
    pub engagements: NumericField,
    #[serde(default)]
    pub profile_visits: NumericField,
    #[serde(default)]
    pub new_follows: NumericField,
    #[serde(default)]
    pub likes: NumericField,
    #[serde(default)]
    pub bookmarks: NumericField,
    #[serde(default)]
    pub shares: NumericField,
    #[serde(default)]
    pub unfollows: NumericField,
    #[serde(default)]
    pub replies: NumericField,
    #[serde(default)]
    pub reposts: NumericField,
    #[serde(default)]
    pub create_post: NumericField,
    #[serde(default)]
    pub video_views: NumericField,
    #[serde(default)]
    pub media_views: NumericField,
}

impl OverviewRow {
    /// A row with only the required fields set.
    pub fn new(date: NaiveDate, impressions: f64) -> Self {
        Self {
            date,
            impressions,
            engagements: NumericField::Missing,
            profile_visits: NumericField::Missing,
            new_follows: NumericField::Missing,
            likes: NumericField::Missing,
            bookmarks: NumericField::Missing,
            shares: NumericField::Missing,
            unfollows: NumericField::Missing,
            replies: NumericField::Missing,
            reposts: NumericField::Missing,
            create_post: NumericField::Missing,
            video_views: NumericField::Missing,
            media_views: NumericField::Missing,
        }
    }
}

/// Output of one normalization call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult<T> {
    pub rows: Vec<T>,
    pub missing_required: Vec<CanonicalField>,
    pub missing_optional: Vec<CanonicalField>,
    pub warnings: Vec<String>,
}

impl<T> NormalizationResult<T> {
    /// True when every required field resolved to a header.
    pub fn is_resolved(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Serde adapter for `Option<DateTime<Utc>>` as an ISO-8601 string with
/// millisecond precision, or `""` when absent.
pub(crate) mod iso_instant {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn format(value: Option<&DateTime<Utc>>) -> String {
        value
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default()
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value.as_ref()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(de::Error::custom)
    }
}
