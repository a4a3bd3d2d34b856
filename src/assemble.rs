//! Object-to-table assembly.
//!
//! Orchestrates the column expander, reference classifier, and entity
//! extractor per object kind, and projects the processed records into the
//! typed per-table batches handed to storage.

use crate::entities::extract_entities;
use crate::error::Result;
use crate::expand::expand_dict_column;
use crate::model::{AuthorRow, Record, TableBatches, TweetRow};
use crate::references::classify_references;
use crate::schema::{self, ObjectKind};
use serde_json::Value;
use tracing::debug;

/// Process a raw tweet batch into the `tweet` table plus its side tables.
///
/// Order matters: references are classified before the final projection
/// (classification consumes `referenced_tweets`, which is not a final
/// column) and before metrics expansion.
///
/// # Errors
///
/// Fails on strict-mode schema violations, on metrics expansion over an
/// all-null column, and on records missing required identity fields.
pub fn tweet_object_to_table(
    mut tweets: Vec<Record>,
    tables: &mut TableBatches,
    strict: bool,
) -> Result<()> {
    if strict {
        schema::validate_object(&tweets, ObjectKind::Tweet)?;
    }
    if tweets.is_empty() {
        return Ok(());
    }

    // tweet_type is computed, never supplied by the API.
    for rec in &mut tweets {
        rec.insert("tweet_type".to_string(), Value::from(0));
    }

    classify_references(&mut tweets, tables)?;
    expand_dict_column(&mut tweets, "public_metrics", None)?;
    extract_entities(&tweets, tables)?;

    for rec in &tweets {
        tables.tweets.push(TweetRow::from_record(rec)?);
    }
    debug!(rows = tweets.len(), "assembled tweet batch");

    Ok(())
}

/// Process a raw user batch into the `author` table.
///
/// # Errors
///
/// Fails on strict-mode schema violations, on metrics expansion over an
/// all-null column, and on records without an `id`.
pub fn user_object_to_table(
    mut users: Vec<Record>,
    tables: &mut TableBatches,
    strict: bool,
) -> Result<()> {
    if strict {
        schema::validate_object(&users, ObjectKind::User)?;
    }
    if users.is_empty() {
        return Ok(());
    }

    expand_dict_column(&mut users, "public_metrics", None)?;

    for rec in &users {
        tables.authors.push(AuthorRow::from_record(rec)?);
    }
    debug!(rows = users.len(), "assembled user batch");

    Ok(())
}
