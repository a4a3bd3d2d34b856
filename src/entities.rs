//! Entity extraction from tweet entity bags.
//!
//! Each recognized entity kind (mentions, urls, hashtags, cashtags,
//! annotations) is exploded into its own side table with one row per
//! occurrence, keyed by the owning tweet's id.

use crate::error::Result;
use crate::expand::{expand_dict_column, rename_key};
use crate::model::{
    AnnotationRow, MentionRow, Record, TableBatches, TagRow, UrlRow, count, opt_f64, opt_str,
    req_str,
};
use serde_json::Value;
use tracing::debug;

/// A structured annotation kind embedded in tweet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Mentions,
    Urls,
    Hashtags,
    Annotations,
    Cashtags,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Mentions,
        Self::Urls,
        Self::Hashtags,
        Self::Annotations,
        Self::Cashtags,
    ];

    /// The key of this kind's list inside the `entities` bag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mentions => "mentions",
            Self::Urls => "urls",
            Self::Hashtags => "hashtags",
            Self::Annotations => "annotations",
            Self::Cashtags => "cashtags",
        }
    }

    /// Target side table for this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Mentions => "mentions_tweet_mapping",
            Self::Urls => "urls_tweet_mapping",
            Self::Hashtags => "hashtags_tweet_mapping",
            Self::Annotations => "annotations_tweet_mapping",
            Self::Cashtags => "cashtags_tweet_mapping",
        }
    }
}

/// Extract per-occurrence entity rows from a tweet batch.
///
/// Tweets without an entity bag, and kinds whose list is absent or empty,
/// contribute nothing. Mention elements carry the mentioned user's id
/// under an `id` key; it is renamed to `author_id` to disambiguate from
/// the owning tweet's id.
///
/// # Errors
///
/// Returns an error when an exploded element cannot be expanded into the
/// declared columns of its side table.
pub fn extract_entities(tweets: &[Record], tables: &mut TableBatches) -> Result<()> {
    for kind in EntityKind::ALL {
        let mut rows: Vec<Record> = Vec::new();
        for tweet in tweets {
            let Some(bag) = tweet.get("entities").and_then(Value::as_object) else {
                continue;
            };
            let Some(id) = opt_str(tweet, "id") else {
                continue;
            };
            let Some(list) = bag.get(kind.as_str()).and_then(Value::as_array) else {
                continue;
            };
            for element in list {
                if element.is_null() {
                    continue;
                }
                let mut row = Record::new();
                row.insert("tweet_id".to_string(), Value::String(id.clone()));
                row.insert(kind.as_str().to_string(), element.clone());
                rows.push(row);
            }
        }

        if rows.is_empty() {
            continue;
        }

        expand_dict_column(&mut rows, kind.as_str(), None)?;
        if kind == EntityKind::Mentions {
            for row in &mut rows {
                rename_key(row, "id", "author_id");
            }
        }

        debug!(kind = kind.as_str(), rows = rows.len(), "extracted entities");
        for row in &rows {
            append_row(kind, row, tables)?;
        }
    }

    Ok(())
}

/// Project an expanded element onto its side table's declared columns.
fn append_row(kind: EntityKind, row: &Record, tables: &mut TableBatches) -> Result<()> {
    let tweet_id = req_str(row, "tweet_id", "entity")?;
    let start = count(row, "start");
    let end = count(row, "end");

    match kind {
        EntityKind::Hashtags => tables.hashtags.push(TagRow {
            tweet_id,
            start,
            end,
            tag: opt_str(row, "tag"),
        }),
        EntityKind::Cashtags => tables.cashtags.push(TagRow {
            tweet_id,
            start,
            end,
            tag: opt_str(row, "tag"),
        }),
        EntityKind::Urls => tables.urls.push(UrlRow {
            tweet_id,
            start,
            end,
            url: opt_str(row, "url"),
            expanded_url: opt_str(row, "expanded_url"),
            display_url: opt_str(row, "display_url"),
        }),
        EntityKind::Mentions => tables.mentions.push(MentionRow {
            tweet_id,
            start,
            end,
            username: opt_str(row, "username"),
            author_id: opt_str(row, "author_id"),
        }),
        EntityKind::Annotations => tables.annotations.push(AnnotationRow {
            tweet_id,
            start,
            end,
            probability: opt_f64(row, "probability"),
            annotation_type: opt_str(row, "type"),
            normalized_text: opt_str(row, "normalized_text"),
        }),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(map) => map,
                    other => panic!("expected object, got {other}"),
                })
                .collect(),
            other => panic!("expected array, got {other}"),
        }
    }

    #[test]
    fn hashtag_extraction_round_trip() {
        let tweets = records(json!([
            {
                "id": "1",
                "entities": {
                    "hashtags": [{"start": 0, "end": 2, "tag": "x"}],
                    "urls": [],
                    "mentions": null
                }
            },
        ]));
        let mut tables = TableBatches::default();

        extract_entities(&tweets, &mut tables).unwrap();

        assert_eq!(
            tables.hashtags,
            vec![TagRow {
                tweet_id: "1".to_string(),
                start: 0,
                end: 2,
                tag: Some("x".to_string()),
            }]
        );
        // Empty and null lists contribute nothing, not empty rows.
        assert!(tables.urls.is_empty());
        assert!(tables.mentions.is_empty());
    }

    #[test]
    fn null_entity_bag_contributes_nothing() {
        let tweets = records(json!([
            {"id": "1", "entities": null},
            {"id": "2"},
        ]));
        let mut tables = TableBatches::default();

        extract_entities(&tweets, &mut tables).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn mention_id_becomes_author_id() {
        let tweets = records(json!([
            {
                "id": "5",
                "entities": {
                    "mentions": [
                        {"start": 3, "end": 10, "username": "jack", "id": "12"}
                    ]
                }
            },
        ]));
        let mut tables = TableBatches::default();

        extract_entities(&tweets, &mut tables).unwrap();

        assert_eq!(tables.mentions.len(), 1);
        let row = &tables.mentions[0];
        assert_eq!(row.tweet_id, "5");
        assert_eq!(row.author_id.as_deref(), Some("12"));
        assert_eq!(row.username.as_deref(), Some("jack"));
    }

    #[test]
    fn urls_and_annotations_carry_payloads() {
        let tweets = records(json!([
            {
                "id": "8",
                "entities": {
                    "urls": [{
                        "start": 0,
                        "end": 23,
                        "url": "https://t.co/abc",
                        "expanded_url": "https://example.com/post",
                        "display_url": "example.com/post",
                        "status": 200
                    }],
                    "annotations": [{
                        "start": 4,
                        "end": 9,
                        "probability": 0.97,
                        "type": "Person",
                        "normalized_text": "Ada"
                    }]
                }
            },
        ]));
        let mut tables = TableBatches::default();

        extract_entities(&tweets, &mut tables).unwrap();

        let url = &tables.urls[0];
        assert_eq!(url.expanded_url.as_deref(), Some("https://example.com/post"));

        let ann = &tables.annotations[0];
        assert_eq!(ann.annotation_type.as_deref(), Some("Person"));
        assert!((ann.probability.unwrap() - 0.97).abs() < f64::EPSILON);
        assert_eq!(ann.normalized_text.as_deref(), Some("Ada"));
    }

    #[test]
    fn occurrences_from_many_tweets_accumulate() {
        let tweets = records(json!([
            {"id": "1", "entities": {"hashtags": [{"start": 0, "end": 4, "tag": "rust"}]}},
            {"id": "2", "entities": {"hashtags": [
                {"start": 0, "end": 4, "tag": "rust"},
                {"start": 5, "end": 8, "tag": "sql"}
            ]}},
        ]));
        let mut tables = TableBatches::default();

        extract_entities(&tweets, &mut tables).unwrap();

        assert_eq!(tables.hashtags.len(), 3);
        assert_eq!(tables.hashtags[2].tag.as_deref(), Some("sql"));
    }
}
