//! Column coercion helpers
//!
//! Rows from a joined search carry the joined table's columns under an alias
//! prefix (`topic__title`, `user__id`), so one mapper serves both the primary
//! row and an eager-loaded relation.

use forum_core::{DomainError, DomainResult};

use crate::query::Value;
use crate::row::Row;

/// Separator between alias prefix and column name
pub const PREFIX_SEPARATOR: &str = "__";

/// Storage sentinel meaning "no value" in user profile columns
pub const NULL_SENTINEL: &str = "NULL";

/// Storage sentinel meaning "no signature" on posts
pub const NO_SIGNATURE_SENTINEL: &str = "False";

/// Column name as it appears in a row read through `prefix`
pub fn column_name(prefix: &str, column: &str) -> String {
    if prefix.is_empty() {
        column.to_string()
    } else {
        format!("{prefix}{PREFIX_SEPARATOR}{column}")
    }
}

/// Select list for a joined table: `table.col AS prefix__col` for each column
pub fn joined_fields(table: &str, prefix: &str, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .map(|column| format!("{table}.{column} AS {}", column_name(prefix, column)))
        .collect()
}

fn lookup<'r>(row: &'r Row, prefix: &str, column: &str) -> Option<&'r Value> {
    row.get(&column_name(prefix, column))
}

/// Whether the row carries any column for `prefix`
pub fn has_column(row: &Row, prefix: &str, column: &str) -> bool {
    lookup(row, prefix, column).is_some()
}

/// Integer column; absent or null reads as `None`
pub fn int(row: &Row, prefix: &str, column: &str) -> DomainResult<Option<i64>> {
    match lookup(row, prefix, column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            DomainError::MalformedRow(format!(
                "column `{}` is not an integer: {value:?}",
                column_name(prefix, column)
            ))
        }),
    }
}

/// Integer column the query contract guarantees
pub fn require_int(row: &Row, prefix: &str, column: &str) -> DomainResult<i64> {
    int(row, prefix, column)?.ok_or_else(|| {
        DomainError::MalformedRow(format!("missing column `{}`", column_name(prefix, column)))
    })
}

/// Text column; absent or null reads as `None`
pub fn text(row: &Row, prefix: &str, column: &str) -> Option<String> {
    lookup(row, prefix, column).and_then(Value::to_text)
}

/// Nullable text column with a storage sentinel
///
/// Outer `None`: the column was not selected. `Some(None)`: null, or the
/// sentinel. An empty string stays an empty string.
pub fn text_or_sentinel(
    row: &Row,
    prefix: &str,
    column: &str,
    sentinel: &str,
) -> Option<Option<String>> {
    let value = lookup(row, prefix, column)?;
    Some(value.to_text().filter(|text| text != sentinel))
}
