//! Column operations over in-flight record batches.
//!
//! The central utility is [`expand_dict_column`], which flattens a column
//! whose cells are nested key-value objects into sibling columns, one per
//! key. This is how `public_metrics` sub-objects and exploded entity
//! elements become flat columns before projection.

use crate::error::{Result, TwarcDbError};
use crate::model::Record;
use serde_json::Value;

/// Expand a column of nested key-value objects into sibling columns.
///
/// For every key, each row gains a column holding the row's value at that
/// key, or null when the row's cell is null/absent or lacks the key. The
/// key set is either supplied by the caller or inferred from the first
/// non-null cell. The source column is left in place; callers re-applying
/// the expansion with the same key set get identical results.
///
/// # Errors
///
/// Returns [`TwarcDbError::ExpansionInference`] when `keys` is `None` and
/// no row holds a non-null object in `column`.
pub fn expand_dict_column(
    rows: &mut [Record],
    column: &str,
    keys: Option<&[&str]>,
) -> Result<()> {
    let keys: Vec<String> = match keys {
        Some(keys) => keys.iter().map(ToString::to_string).collect(),
        None => infer_keys(rows, column)?,
    };

    for row in rows.iter_mut() {
        for key in &keys {
            let value = row
                .get(column)
                .and_then(|cell| cell.get(key))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(key.clone(), value);
        }
    }

    Ok(())
}

/// Key set of the first non-null object cell in `column`.
fn infer_keys(rows: &[Record], column: &str) -> Result<Vec<String>> {
    rows.iter()
        .find_map(|row| row.get(column).and_then(Value::as_object))
        .map(|cell| cell.keys().cloned().collect())
        .ok_or_else(|| TwarcDbError::ExpansionInference {
            column: column.to_string(),
        })
}

/// Rename a key in a record, overwriting any existing value at `to`.
/// No-op when `from` is absent.
pub fn rename_key(row: &mut Record, from: &str, to: &str) {
    if let Some(value) = row.remove(from) {
        row.insert(to.to_string(), value);
    }
}
