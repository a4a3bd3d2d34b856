//! Schema registry for twarc objects and their target tables.
//!
//! Static mapping from object kind to the field set the raw API object is
//! expected to carry, and from each target table to the ordered column list
//! its rows must contain after processing. Pure data plus validation; all
//! transformation logic lives in the pipeline modules.

use crate::error::{Result, TwarcDbError};
use crate::model::Record;
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

/// The category of a decoded API entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Tweet,
    User,
    Media,
    Place,
    Poll,
    Error,
}

impl ObjectKind {
    /// Stable name used in error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::User => "user",
            Self::Media => "media",
            Self::Place => "place",
            Self::Poll => "poll",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload order for table batches. Parents come before rows that reference
/// them so foreign-key checks pass at the storage boundary. The trailing
/// tables are placeholders reserved for object kinds the pipeline does not
/// normalize yet.
pub const TABLE_PRIORITY: [&str; 14] = [
    "author",
    "tweet",
    "quoted_tweet_mapping",
    "retweeted_tweet_mapping",
    "replied_to_tweet_mapping",
    "hashtags_tweet_mapping",
    "cashtags_tweet_mapping",
    "urls_tweet_mapping",
    "mentions_tweet_mapping",
    "annotations_tweet_mapping",
    "media",
    "places",
    "polls",
    "errors",
];

/// Field sets the raw API objects are expected to carry, keyed by kind.
///
/// Used only by strict validation; the pipeline itself tolerates missing
/// optional fields.
static OBJECT_FIELDS: Lazy<HashMap<ObjectKind, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<ObjectKind, &'static [&'static str]> = HashMap::new();
    m.insert(
        ObjectKind::Tweet,
        &[
            "edit_history_tweet_ids",
            "text",
            "edit_controls",
            "conversation_id",
            "lang",
            "entities",
            "possibly_sensitive",
            "author_id",
            "reply_settings",
            "id",
            "created_at",
            "public_metrics",
            "context_annotations",
            "referenced_tweets",
            "attachments",
            "in_reply_to_user_id",
            "geo",
        ][..],
    );
    m.insert(
        ObjectKind::User,
        &[
            "created_at",
            "description",
            "id",
            "location",
            "name",
            "profile_image_url",
            "protected",
            "url",
            "username",
            "verified",
            "entities",
            "pinned_tweet_id",
            "public_metrics",
        ][..],
    );
    m.insert(
        ObjectKind::Media,
        &[
            "media_key",
            "type",
            "url",
            "duration_ms",
            "height",
            "preview_image_url",
            "public_metrics",
            "width",
            "alt_text",
            "variants",
        ][..],
    );
    m.insert(
        ObjectKind::Place,
        &[
            "full_name",
            "id",
            "contained_within",
            "name",
            "geo",
            "country_code",
            "country",
            "place_type",
        ][..],
    );
    m.insert(
        ObjectKind::Poll,
        &["id", "options", "duration_minutes", "end_datetime", "voting_status"][..],
    );
    m.insert(
        ObjectKind::Error,
        &["value", "detail", "title", "resource_type", "parameter", "resource_id", "type"][..],
    );
    m
});

/// Ordered column lists per target table. Storage derives its INSERT
/// statements from these, so the order here is the order rows are bound in.
static TABLE_COLUMNS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert(
        "tweet",
        &[
            "id",
            "author_id",
            "created_at",
            "text",
            "conversation_id",
            "lang",
            "possibly_sensitive",
            "reply_settings",
            "in_reply_to_user_id",
            "tweet_type",
            "retweet_count",
            "reply_count",
            "like_count",
            "quote_count",
            "impression_count",
        ][..],
    );
    m.insert(
        "author",
        &[
            "id",
            "name",
            "username",
            "created_at",
            "description",
            "location",
            "profile_image_url",
            "url",
            "protected",
            "verified",
            "followers_count",
            "following_count",
            "tweet_count",
            "listed_count",
        ][..],
    );
    m.insert("quoted_tweet_mapping", &["tweet_id", "id"][..]);
    m.insert("retweeted_tweet_mapping", &["tweet_id", "id"][..]);
    m.insert(
        "replied_to_tweet_mapping",
        &["id", "tweet_id", "in_reply_to_user_id"][..],
    );
    m.insert("hashtags_tweet_mapping", &["tweet_id", "start", "end", "tag"][..]);
    m.insert("cashtags_tweet_mapping", &["tweet_id", "start", "end", "tag"][..]);
    m.insert(
        "urls_tweet_mapping",
        &["tweet_id", "start", "end", "url", "expanded_url", "display_url"][..],
    );
    m.insert(
        "mentions_tweet_mapping",
        &["tweet_id", "start", "end", "username", "author_id"][..],
    );
    m.insert(
        "annotations_tweet_mapping",
        &["tweet_id", "start", "end", "probability", "type", "normalized_text"][..],
    );
    m
});

/// Expected raw field set for an object kind.
#[must_use]
pub fn object_fields(kind: ObjectKind) -> &'static [&'static str] {
    OBJECT_FIELDS.get(&kind).copied().unwrap_or(&[])
}

/// Ordered output columns for a table, if the registry knows it.
#[must_use]
pub fn table_columns(table: &str) -> Option<&'static [&'static str]> {
    TABLE_COLUMNS.get(table).copied()
}

/// Validate a raw object batch against the registry.
///
/// Fails when the batch is empty or when the union of field names across
/// its records differs from the expected field set for the kind.
///
/// # Errors
///
/// Returns [`TwarcDbError::SchemaShape`] describing the mismatch.
pub fn validate_object(rows: &[Record], kind: ObjectKind) -> Result<()> {
    if rows.is_empty() {
        return Err(TwarcDbError::SchemaShape {
            kind: kind.to_string(),
            reason: "must have at least one row".to_string(),
        });
    }

    let expected: BTreeSet<&str> = object_fields(kind).iter().copied().collect();
    let seen: BTreeSet<&str> = rows
        .iter()
        .flat_map(|rec| rec.keys().map(String::as_str))
        .collect();

    if seen != expected {
        let missing: Vec<&str> = expected.difference(&seen).copied().collect();
        let unexpected: Vec<&str> = seen.difference(&expected).copied().collect();
        return Err(TwarcDbError::SchemaShape {
            kind: kind.to_string(),
            reason: format!("missing fields {missing:?}, unexpected fields {unexpected:?}"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn table_priority_puts_parents_first() {
        let author = TABLE_PRIORITY.iter().position(|t| *t == "author").unwrap();
        let tweet = TABLE_PRIORITY.iter().position(|t| *t == "tweet").unwrap();
        let quoted = TABLE_PRIORITY
            .iter()
            .position(|t| *t == "quoted_tweet_mapping")
            .unwrap();
        assert!(author < tweet);
        assert!(tweet < quoted);
    }

    #[test]
    fn every_mapping_table_has_columns() {
        for table in [
            "tweet",
            "author",
            "quoted_tweet_mapping",
            "retweeted_tweet_mapping",
            "replied_to_tweet_mapping",
            "hashtags_tweet_mapping",
            "cashtags_tweet_mapping",
            "urls_tweet_mapping",
            "mentions_tweet_mapping",
            "annotations_tweet_mapping",
        ] {
            let columns = table_columns(table).unwrap();
            assert!(!columns.is_empty(), "{table} has no columns");
        }
        assert!(table_columns("media").is_none());
    }

    #[test]
    fn validate_rejects_empty_batch() {
        let err = validate_object(&[], ObjectKind::Tweet).unwrap_err();
        assert!(err.to_string().contains("at least one row"));
    }

    #[test]
    fn validate_rejects_field_mismatch() {
        let rows = vec![record(json!({"id": "1", "text": "hi"}))];
        let err = validate_object(&rows, ObjectKind::Tweet).unwrap_err();
        assert!(err.to_string().contains("missing fields"));
    }

    #[test]
    fn validate_accepts_exact_field_set() {
        let mut rec = Record::new();
        for field in object_fields(ObjectKind::Poll) {
            rec.insert((*field).to_string(), serde_json::Value::Null);
        }
        validate_object(&[rec], ObjectKind::Poll).unwrap();
    }
}
