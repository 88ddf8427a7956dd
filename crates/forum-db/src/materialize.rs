//! Result materializers
//!
//! Turn a fully drained result set into the shapes callers ask for. Rows are
//! owned by the caller once fetched, so nothing here outlives one query.

use std::collections::HashMap;

use forum_core::{DomainError, DomainResult};

use crate::query::Value;
use crate::row::Row;

/// Key column used by [`dict`] when the caller does not name one
pub const DEFAULT_KEY_FIELD: &str = "id";

/// First row, or `None` when the query matched nothing
pub fn first_row(rows: Vec<Row>) -> Option<Row> {
    rows.into_iter().next()
}

/// First column of the first row
pub fn first_value(rows: Vec<Row>) -> Option<Value> {
    first_row(rows).and_then(|row| row.first().cloned())
}

/// Project one column across all rows, preserving row order
pub fn list(rows: Vec<Row>, field: &str) -> DomainResult<Vec<Value>> {
    require_field("list", field)?;
    rows.iter()
        .map(|row| row.require(field).cloned())
        .collect()
}

/// Fold rows into `key_field -> value_field`; later rows overwrite earlier ones
pub fn dict(
    rows: Vec<Row>,
    key_field: Option<&str>,
    value_field: &str,
) -> DomainResult<HashMap<Value, Value>> {
    require_field("dict", value_field)?;
    let key_field = key_field.unwrap_or(DEFAULT_KEY_FIELD);
    require_field("dict", key_field)?;

    let mut folded = HashMap::with_capacity(rows.len());
    for row in &rows {
        folded.insert(
            row.require(key_field)?.clone(),
            row.require(value_field)?.clone(),
        );
    }
    Ok(folded)
}

/// Reject a projection that names no field, before any statement runs
pub(crate) fn require_field(materializer: &str, field: &str) -> DomainResult<()> {
    if field.trim().is_empty() {
        return Err(DomainError::usage(format!(
            "{materializer} materialization needs a field to project"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_rows() -> Vec<Row> {
        vec![
            Row::from_pairs([("id", Value::Int(1)), ("count", Value::Int(10))]),
            Row::from_pairs([("id", Value::Int(2)), ("count", Value::Int(20))]),
            Row::from_pairs([("id", Value::Int(1)), ("count", Value::Int(30))]),
        ]
    }

    #[test]
    fn test_dict_last_write_wins() {
        let folded = dict(count_rows(), Some("id"), "count").unwrap();
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[&Value::Int(1)], Value::Int(30));
        assert_eq!(folded[&Value::Int(2)], Value::Int(20));
    }

    #[test]
    fn test_dict_defaults_key_to_id() {
        let folded = dict(count_rows(), None, "count").unwrap();
        assert_eq!(folded[&Value::Int(2)], Value::Int(20));
    }

    #[test]
    fn test_missing_value_field_is_usage_error() {
        assert!(dict(count_rows(), None, "").unwrap_err().is_usage());
        assert!(list(count_rows(), " ").unwrap_err().is_usage());
    }

    #[test]
    fn test_list_preserves_order() {
        let ids = list(count_rows(), "id").unwrap();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn test_first_row_and_value() {
        assert!(first_row(Vec::new()).is_none());
        assert_eq!(first_value(count_rows()), Some(Value::Int(1)));
        assert_eq!(first_value(Vec::new()), None);
    }

    #[test]
    fn test_list_of_unknown_column_is_malformed() {
        let err = list(count_rows(), "title").unwrap_err();
        assert!(matches!(err, DomainError::MalformedRow(_)));
    }
}
