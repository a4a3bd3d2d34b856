//! Referenced-tweet classification.
//!
//! Explodes each tweet's `referenced_tweets` list, splits it by relation
//! kind, fills the per-kind mapping tables, and accumulates the derived
//! `tweet_type` classification on the tweet records themselves.

use crate::error::Result;
use crate::expand::{expand_dict_column, rename_key};
use crate::model::{Record, RefMappingRow, ReplyMappingRow, TableBatches, count, opt_str, req_str};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// The relation a tweet has to another tweet it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Quoted,
    Retweeted,
    RepliedTo,
}

impl ReferenceKind {
    pub const ALL: [Self; 3] = [Self::Quoted, Self::Retweeted, Self::RepliedTo];

    /// The `type` value the API uses for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quoted => "quoted",
            Self::Retweeted => "retweeted",
            Self::RepliedTo => "replied_to",
        }
    }

    /// Additive contribution to `tweet_type`. A tweet matching several
    /// kinds sums their weights (quoted + replied_to = 4).
    #[must_use]
    pub const fn weight(self) -> i64 {
        match self {
            Self::Quoted => 1,
            Self::Retweeted => 2,
            Self::RepliedTo => 3,
        }
    }

    /// Target mapping table for this kind.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Quoted => "quoted_tweet_mapping",
            Self::Retweeted => "retweeted_tweet_mapping",
            Self::RepliedTo => "replied_to_tweet_mapping",
        }
    }
}

/// Classify the `referenced_tweets` of a tweet batch.
///
/// Emits one mapping row per reference into the matching table batch and
/// increments each referencing tweet's `tweet_type` by the kind's weight,
/// at most once per kind per tweet. Tweets without references are left at
/// `tweet_type == 0`. Reference elements with an unrecognized `type` are
/// ignored.
///
/// # Errors
///
/// Returns an error when a tweet record has no `id`, or when a reference
/// element lacks its `id` after expansion.
pub fn classify_references(tweets: &mut [Record], tables: &mut TableBatches) -> Result<()> {
    // Explode: one row per reference element, carrying the referencing
    // tweet's id under a temporary name so the element's own id can be
    // expanded without collision.
    let mut exploded: Vec<Record> = Vec::new();
    for tweet in tweets.iter() {
        let id = req_str(tweet, "id", "tweet")?;
        let Some(refs) = tweet.get("referenced_tweets").and_then(Value::as_array) else {
            continue;
        };
        for element in refs {
            if element.is_null() {
                continue;
            }
            let mut row = Record::new();
            row.insert("actual_id".to_string(), Value::String(id.clone()));
            row.insert(
                "in_reply_to_user_id".to_string(),
                tweet.get("in_reply_to_user_id").cloned().unwrap_or(Value::Null),
            );
            row.insert("referenced_tweets".to_string(), element.clone());
            exploded.push(row);
        }
    }

    if exploded.is_empty() {
        return Ok(());
    }

    expand_dict_column(&mut exploded, "referenced_tweets", Some(&["id", "type"]))?;
    for row in &mut exploded {
        rename_key(row, "id", "tweet_id");
        rename_key(row, "actual_id", "id");
    }

    for kind in ReferenceKind::ALL {
        let mut referencing: HashSet<String> = HashSet::new();

        for row in exploded
            .iter()
            .filter(|row| opt_str(row, "type").as_deref() == Some(kind.as_str()))
        {
            let id = req_str(row, "id", "referenced_tweets")?;
            let tweet_id = req_str(row, "tweet_id", "referenced_tweets")?;
            referencing.insert(id.clone());

            match kind {
                ReferenceKind::Quoted => tables.quoted.push(RefMappingRow { tweet_id, id }),
                ReferenceKind::Retweeted => tables.retweeted.push(RefMappingRow { tweet_id, id }),
                ReferenceKind::RepliedTo => tables.replied_to.push(ReplyMappingRow {
                    id,
                    tweet_id,
                    in_reply_to_user_id: opt_str(row, "in_reply_to_user_id"),
                }),
            }
        }

        if referencing.is_empty() {
            continue;
        }
        debug!(
            kind = kind.as_str(),
            tweets = referencing.len(),
            "classified references"
        );

        for tweet in tweets.iter_mut() {
            if opt_str(tweet, "id").is_some_and(|id| referencing.contains(&id)) {
                let bumped = count(tweet, "tweet_type") + kind.weight();
                tweet.insert(
                    "tweet_type".to_string(),
                    Value::Number(serde_json::Number::from(bumped)),
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tweet_records(value: serde_json::Value) -> Vec<Record> {
        match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(mut map) => {
                        map.insert("tweet_type".to_string(), json!(0));
                        map
                    }
                    other => panic!("expected object, got {other}"),
                })
                .collect(),
            other => panic!("expected array, got {other}"),
        }
    }

    #[test]
    fn no_references_stays_original() {
        let mut tweets = tweet_records(json!([
            {"id": "1", "referenced_tweets": null},
            {"id": "2"},
        ]));
        let mut tables = TableBatches::default();

        classify_references(&mut tweets, &mut tables).unwrap();

        assert_eq!(count(&tweets[0], "tweet_type"), 0);
        assert_eq!(count(&tweets[1], "tweet_type"), 0);
        assert!(tables.quoted.is_empty());
        assert!(tables.retweeted.is_empty());
        assert!(tables.replied_to.is_empty());
    }

    #[test]
    fn retweet_maps_and_classifies() {
        let mut tweets = tweet_records(json!([
            {"id": "1", "referenced_tweets": [{"id": "2", "type": "retweeted"}]},
        ]));
        let mut tables = TableBatches::default();

        classify_references(&mut tweets, &mut tables).unwrap();

        assert_eq!(count(&tweets[0], "tweet_type"), 2);
        assert_eq!(
            tables.retweeted,
            vec![RefMappingRow {
                tweet_id: "2".to_string(),
                id: "1".to_string(),
            }]
        );
    }

    #[test]
    fn quote_reply_combination_is_additive() {
        let mut tweets = tweet_records(json!([
            {
                "id": "1",
                "in_reply_to_user_id": "77",
                "referenced_tweets": [
                    {"id": "2", "type": "quoted"},
                    {"id": "3", "type": "replied_to"}
                ]
            },
        ]));
        let mut tables = TableBatches::default();

        classify_references(&mut tweets, &mut tables).unwrap();

        assert_eq!(count(&tweets[0], "tweet_type"), 4);
        assert_eq!(tables.quoted.len(), 1);
        assert_eq!(tables.replied_to.len(), 1);
        assert_eq!(
            tables.replied_to[0].in_reply_to_user_id.as_deref(),
            Some("77")
        );
        // Each relation kind gets its own row in its own table.
        assert!(tables.retweeted.is_empty());
    }

    #[test]
    fn repeated_kind_increments_once() {
        let mut tweets = tweet_records(json!([
            {
                "id": "1",
                "referenced_tweets": [
                    {"id": "2", "type": "quoted"},
                    {"id": "3", "type": "quoted"}
                ]
            },
        ]));
        let mut tables = TableBatches::default();

        classify_references(&mut tweets, &mut tables).unwrap();

        // Two mapping rows, but a single +1 for the quoted kind.
        assert_eq!(tables.quoted.len(), 2);
        assert_eq!(count(&tweets[0], "tweet_type"), 1);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let mut tweets = tweet_records(json!([
            {"id": "1", "referenced_tweets": [{"id": "2", "type": "pinned"}]},
        ]));
        let mut tables = TableBatches::default();

        classify_references(&mut tweets, &mut tables).unwrap();

        assert_eq!(count(&tweets[0], "tweet_type"), 0);
        assert!(tables.is_empty());
    }

    #[test]
    fn weights_match_classification_contract() {
        assert_eq!(ReferenceKind::Quoted.weight(), 1);
        assert_eq!(ReferenceKind::Retweeted.weight(), 2);
        assert_eq!(ReferenceKind::RepliedTo.weight(), 3);
        assert_eq!(ReferenceKind::Quoted.table(), "quoted_tweet_mapping");
    }
}
