//! Tag row mapping

use forum_core::{DomainResult, TagName};

use crate::entities::Tag;
use crate::row::Row;

use super::columns::{int, text, text_or_sentinel, NULL_SENTINEL};

pub const TAG_TABLE: &str = "tags";

impl Tag {
    pub(crate) fn from_row(row: &Row, prefix: &str) -> DomainResult<Self> {
        let name = text(row, prefix, "name").unwrap_or_default();
        let mut tag = Tag::new(TagName::new(name)?);
        tag.apply_row(row, prefix)?;
        Ok(tag)
    }

    /// Fill metadata from the row's `prefix` columns; the name is identity and stays
    pub(crate) fn apply_row(&mut self, row: &Row, prefix: &str) -> DomainResult<()> {
        if let Some(id) = int(row, prefix, "id")? {
            self.id = Some(id);
        }
        if let Some(description) = text_or_sentinel(row, prefix, "description", NULL_SENTINEL) {
            self.description = Some(description);
        }
        if let Some(v) = int(row, prefix, "access")? {
            self.access = Some(v);
        }
        if let Some(v) = int(row, prefix, "participation")? {
            self.participation = Some(v);
        }
        if let Some(v) = int(row, prefix, "permanent")? {
            self.permanent = Some(v);
        }
        if let Some(v) = int(row, prefix, "inceptive")? {
            self.inceptive = Some(v);
        }
        Ok(())
    }
}
