//! User name history

use serde::Serialize;

/// Name shown for the anonymous user
pub const ANONYMOUS_NAME: &str = "Human";

/// One historical display name, attributed at `date` (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameEntry {
    pub name: String,
    pub date: Option<i64>,
}

impl NameEntry {
    pub fn new(name: impl Into<String>, date: Option<i64>) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

/// Ordered name history of a user, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameHistory(Vec<NameEntry>);

impl NameHistory {
    /// Build a history, ordering entries by date, newest first
    pub fn new(mut entries: Vec<NameEntry>) -> Self {
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Self(entries)
    }

    /// The fixed history of the anonymous user
    pub fn anonymous() -> Self {
        Self(vec![NameEntry::new(ANONYMOUS_NAME, None)])
    }

    /// The current display name: the entry with the greatest date
    ///
    /// Empty when there is no history.
    pub fn current(&self) -> &str {
        self.0
            .iter()
            .max_by_key(|entry| entry.date)
            .map_or("", |entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
