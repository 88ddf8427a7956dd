//! Topic row mapping

use forum_core::{DomainResult, TopicId, UserId};

use crate::entities::{Topic, User};
use crate::query::Query;
use crate::row::Row;

use super::columns::{int, joined_fields, require_int, text};

pub const TOPIC_TABLE: &str = "topics";

/// Alias prefix of a joined topic
pub const TOPIC_PREFIX: &str = "topic";

pub const TOPIC_COLUMNS: &[&str] = &["ll_topicid", "title", "postCount", "lastPostTime", "userid"];

/// Join the topic matching `on` under the `topic__` prefix
pub fn join_topic(query: Query, on: &str) -> Query {
    query
        .fields(joined_fields(TOPIC_TABLE, TOPIC_PREFIX, TOPIC_COLUMNS))
        .inner_join(format!("{TOPIC_TABLE} ON {on}"))
}

impl Topic {
    pub(crate) fn from_row(row: &Row, prefix: &str) -> DomainResult<Self> {
        let mut topic = Topic::new(TopicId::new(require_int(row, prefix, "ll_topicid")?)?);
        topic.apply_row(row, prefix)?;
        Ok(topic)
    }

    /// Fill attributes from the row's `prefix` columns
    ///
    /// The owner is set by identity only; author columns in the same row may
    /// belong to another entity, so callers apply them explicitly.
    pub(crate) fn apply_row(&mut self, row: &Row, prefix: &str) -> DomainResult<()> {
        if let Some(title) = text(row, prefix, "title") {
            self.title = Some(title);
        }
        if let Some(count) = int(row, prefix, "postCount")? {
            self.post_count = Some(count);
        }
        if let Some(at) = int(row, prefix, "lastPostTime")? {
            self.last_post_time = Some(at);
        }
        if let Some(owner) = int(row, prefix, "userid")? {
            let owner = UserId::new(owner)?;
            if self.user.as_ref().map(|user| user.id()) != Some(owner) {
                self.user = Some(Box::new(User::new(owner)));
            }
        }
        Ok(())
    }
}
