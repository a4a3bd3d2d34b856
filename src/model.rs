//! Data models for twarc ingestion.
//!
//! Raw API objects travel through the pipeline as loosely-typed [`Record`]s
//! so the generic column operations (explode, expand, rename) can mutate
//! them. At the end of the pipeline each record is projected into a typed
//! row struct, one per output table, and accumulated in [`TableBatches`]
//! for the storage hand-off.

use crate::error::{Result, TwarcDbError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// A raw API object in flight: one JSON object, mutable by column ops.
pub type Record = serde_json::Map<String, Value>;

// =============================================================================
// Source envelope
// =============================================================================

/// One line of a twarc JSONL file.
///
/// Unknown fields (`meta`, `__twarc`, ...) are ignored; the pipeline only
/// consumes the payload objects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    /// Tweet objects returned by the endpoint.
    #[serde(default)]
    pub data: Vec<Record>,
    /// Expansion objects referenced by the data.
    #[serde(default)]
    pub includes: Includes,
    /// Partial errors for objects the API could not return.
    #[serde(default)]
    pub errors: Vec<Record>,
}

/// The `includes` bag of an envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<Record>,
    #[serde(default)]
    pub tweets: Vec<Record>,
    #[serde(default)]
    pub media: Vec<Record>,
    #[serde(default)]
    pub places: Vec<Record>,
    #[serde(default)]
    pub polls: Vec<Record>,
}

/// Per-kind raw object batches extracted from a chunk of envelopes.
#[derive(Debug, Clone, Default)]
pub struct ObjectBatches {
    pub tweets: Vec<Record>,
    pub users: Vec<Record>,
    pub media: Vec<Record>,
    pub places: Vec<Record>,
    pub polls: Vec<Record>,
    pub errors: Vec<Record>,
}

// =============================================================================
// Output rows
// =============================================================================

/// A normalized row of the `tweet` table.
#[derive(Debug, Clone, PartialEq)]
pub struct TweetRow {
    pub id: String,
    pub author_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub text: String,
    pub conversation_id: Option<String>,
    pub lang: Option<String>,
    pub possibly_sensitive: Option<bool>,
    pub reply_settings: Option<String>,
    pub in_reply_to_user_id: Option<String>,
    /// Derived classification: 0 = original, +1 quoted, +2 retweeted,
    /// +3 replied_to; combinations are additive.
    pub tweet_type: i64,
    pub retweet_count: i64,
    pub reply_count: i64,
    pub like_count: i64,
    pub quote_count: i64,
    pub impression_count: i64,
}

/// A normalized row of the `author` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRow {
    pub id: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub profile_image_url: Option<String>,
    pub url: Option<String>,
    pub protected: Option<bool>,
    pub verified: Option<bool>,
    pub followers_count: i64,
    pub following_count: i64,
    pub tweet_count: i64,
    pub listed_count: i64,
}

/// A row of `quoted_tweet_mapping` or `retweeted_tweet_mapping`:
/// the referencing tweet (`id`) and the tweet it points at (`tweet_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefMappingRow {
    pub tweet_id: String,
    pub id: String,
}

/// A row of `replied_to_tweet_mapping`; replies also carry the replied-to
/// user so threads can be joined without the referenced tweet being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMappingRow {
    pub id: String,
    pub tweet_id: String,
    pub in_reply_to_user_id: Option<String>,
}

/// A hashtag or cashtag occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub tweet_id: String,
    pub start: i64,
    pub end: i64,
    pub tag: Option<String>,
}

/// A URL occurrence with its expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRow {
    pub tweet_id: String,
    pub start: i64,
    pub end: i64,
    pub url: Option<String>,
    pub expanded_url: Option<String>,
    pub display_url: Option<String>,
}

/// A user mention occurrence. `author_id` is the mentioned user's id,
/// renamed from the raw element's ambiguous `id` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionRow {
    pub tweet_id: String,
    pub start: i64,
    pub end: i64,
    pub username: Option<String>,
    pub author_id: Option<String>,
}

/// A contextual annotation occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRow {
    pub tweet_id: String,
    pub start: i64,
    pub end: i64,
    pub probability: Option<f64>,
    pub annotation_type: Option<String>,
    pub normalized_text: Option<String>,
}

/// Per-table row batches accumulated while assembling one chunk.
///
/// Reset at the start of every batch; ownership passes to the storage
/// hand-off, which writes tables in registry priority order.
#[derive(Debug, Clone, Default)]
pub struct TableBatches {
    pub authors: Vec<AuthorRow>,
    pub tweets: Vec<TweetRow>,
    pub quoted: Vec<RefMappingRow>,
    pub retweeted: Vec<RefMappingRow>,
    pub replied_to: Vec<ReplyMappingRow>,
    pub hashtags: Vec<TagRow>,
    pub cashtags: Vec<TagRow>,
    pub urls: Vec<UrlRow>,
    pub mentions: Vec<MentionRow>,
    pub annotations: Vec<AnnotationRow>,
}

impl TableBatches {
    /// Total number of rows across all tables.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.authors.len()
            + self.tweets.len()
            + self.quoted.len()
            + self.retweeted.len()
            + self.replied_to.len()
            + self.hashtags.len()
            + self.cashtags.len()
            + self.urls.len()
            + self.mentions.len()
            + self.annotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }
}

// =============================================================================
// Record field access
// =============================================================================

/// String field, if present and a string.
#[must_use]
pub fn opt_str(rec: &Record, key: &str) -> Option<String> {
    rec.get(key).and_then(Value::as_str).map(String::from)
}

/// Required string field.
///
/// # Errors
///
/// Returns [`TwarcDbError::MissingField`] when the field is absent or not
/// a string.
pub fn req_str(rec: &Record, key: &'static str, kind: &'static str) -> Result<String> {
    opt_str(rec, key).ok_or(TwarcDbError::MissingField { kind, field: key })
}

/// Boolean field, if present and a boolean.
#[must_use]
pub fn opt_bool(rec: &Record, key: &str) -> Option<bool> {
    rec.get(key).and_then(Value::as_bool)
}

/// Float field, if present and numeric.
#[must_use]
pub fn opt_f64(rec: &Record, key: &str) -> Option<f64> {
    rec.get(key).and_then(Value::as_f64)
}

/// Integer count field. The API emits numbers, but counts also survive
/// round-trips through string-typed exports; accept both. Missing or null
/// cells count as zero.
#[must_use]
pub fn count(rec: &Record, key: &str) -> i64 {
    rec.get(key)
        .and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(0)
}

/// RFC 3339 timestamp field, if present and parseable.
#[must_use]
pub fn opt_datetime(rec: &Record, key: &str) -> Option<DateTime<Utc>> {
    rec.get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl TweetRow {
    /// Project a fully processed tweet record (references classified,
    /// metrics expanded) into a typed row.
    ///
    /// # Errors
    ///
    /// Returns an error when a required field (`id`, `author_id`, `text`)
    /// is missing.
    pub fn from_record(rec: &Record) -> Result<Self> {
        Ok(Self {
            id: req_str(rec, "id", "tweet")?,
            author_id: req_str(rec, "author_id", "tweet")?,
            created_at: opt_datetime(rec, "created_at"),
            text: req_str(rec, "text", "tweet")?,
            conversation_id: opt_str(rec, "conversation_id"),
            lang: opt_str(rec, "lang"),
            possibly_sensitive: opt_bool(rec, "possibly_sensitive"),
            reply_settings: opt_str(rec, "reply_settings"),
            in_reply_to_user_id: opt_str(rec, "in_reply_to_user_id"),
            tweet_type: count(rec, "tweet_type"),
            retweet_count: count(rec, "retweet_count"),
            reply_count: count(rec, "reply_count"),
            like_count: count(rec, "like_count"),
            quote_count: count(rec, "quote_count"),
            impression_count: count(rec, "impression_count"),
        })
    }
}

impl AuthorRow {
    /// Project a metrics-expanded user record into a typed row.
    ///
    /// # Errors
    ///
    /// Returns an error when the `id` field is missing.
    pub fn from_record(rec: &Record) -> Result<Self> {
        Ok(Self {
            id: req_str(rec, "id", "user")?,
            name: opt_str(rec, "name"),
            username: opt_str(rec, "username"),
            created_at: opt_datetime(rec, "created_at"),
            description: opt_str(rec, "description"),
            location: opt_str(rec, "location"),
            profile_image_url: opt_str(rec, "profile_image_url"),
            url: opt_str(rec, "url"),
            protected: opt_bool(rec, "protected"),
            verified: opt_bool(rec, "verified"),
            followers_count: count(rec, "followers_count"),
            following_count: count(rec, "following_count"),
            tweet_count: count(rec, "tweet_count"),
            listed_count: count(rec, "listed_count"),
        })
    }
}
