//! Result rows

use forum_core::{DomainError, DomainResult};

use crate::query::Value;

/// One result row: column names and values in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Build a row from borrowed names, mostly useful in tests
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Value of a column; a repeated name resolves to its last occurrence
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rev()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Value of a column that the query contract guarantees is selected
    pub fn require(&self, name: &str) -> DomainResult<&Value> {
        self.get(name)
            .ok_or_else(|| DomainError::MalformedRow(format!("missing column `{name}`")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// First column in select order
    pub fn first(&self) -> Option<&Value> {
        self.columns.first().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}
