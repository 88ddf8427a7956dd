//! Post row mapping

use forum_core::{DomainResult, PostId, TopicId, UserId};

use crate::entities::{Post, Topic, User};
use crate::row::Row;

use super::columns::{has_column, int, require_int, text, text_or_sentinel, NO_SIGNATURE_SENTINEL};
use super::topic::TOPIC_PREFIX;
use super::user::USER_PREFIX;

pub const POST_TABLE: &str = "posts";

impl Post {
    pub(crate) fn from_row(row: &Row) -> DomainResult<Self> {
        let mut post = Post::new(PostId::new(require_int(row, "", "ll_messageid")?)?);
        post.apply_row(row)?;
        Ok(post)
    }

    /// Fill attributes from a primary post row
    ///
    /// The topic and author are always set by identity; joined `topic__` and
    /// `user__` columns, when present, fill them in.
    pub(crate) fn apply_row(&mut self, row: &Row) -> DomainResult<()> {
        if let Some(date) = int(row, "", "date")? {
            self.date = Some(date);
        }
        if let Some(html) = text(row, "", "messagetext") {
            self.html = Some(html);
        }
        if let Some(sig) = text_or_sentinel(row, "", "sig", NO_SIGNATURE_SENTINEL) {
            self.sig = Some(sig);
        }

        if let Some(topic_id) = int(row, "", "ll_topicid")? {
            let mut topic = Topic::new(TopicId::new(topic_id)?);
            if has_column(row, TOPIC_PREFIX, "ll_topicid") {
                topic.apply_row(row, TOPIC_PREFIX)?;
            }
            self.topic = Some(Box::new(topic));
        }
        if let Some(user_id) = int(row, "", "userid")? {
            let mut user = User::new(UserId::new(user_id)?);
            if has_column(row, USER_PREFIX, "id") {
                user.apply_row(row, USER_PREFIX)?;
            }
            self.user = Some(Box::new(user));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Value;
    use crate::testing::{row, text as t};

    #[test]
    fn test_signature_sentinel() {
        let post = Post::from_row(&row(&[
            ("ll_messageid", Value::Int(3)),
            ("sig", t("False")),
        ]))
        .unwrap();
        assert_eq!(post.sig, Some(None));
        assert!(post.topic.is_none());

        let post = Post::from_row(&row(&[("ll_messageid", Value::Int(3)), ("sig", t(""))])).unwrap();
        assert_eq!(post.sig, Some(Some(String::new())));
    }

    #[test]
    fn test_invalid_stored_id_is_rejected() {
        let err = Post::from_row(&row(&[("ll_messageid", Value::Int(0))])).unwrap_err();
        assert!(err.is_not_found());
    }
}
