//! Topic entity

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use forum_core::{DomainError, DomainResult, EntityKind, TopicId, UserId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::mappers::{self, TAG_TABLE, TOPIC_TABLE, USER_PREFIX};
use crate::query::Query;
use crate::session::{Connector, Session};

use super::{wants, Entity, Include, Post, Tag, User};

/// A forum topic
#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    id: TopicId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_post_time: Option<i64>,
    /// Owner; identity only unless the author was joined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

/// One row of a topic's per-user post count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicParticipant {
    pub user: User,
    pub posts: i64,
}

impl Topic {
    pub fn new(id: TopicId) -> Self {
        Self {
            id,
            title: None,
            post_count: None,
            last_post_time: None,
            user: None,
            tags: None,
        }
    }

    /// Validate a raw id and construct
    pub fn from_id(id: i64) -> DomainResult<Self> {
        Ok(Self::new(TopicId::new(id)?))
    }

    #[inline]
    pub fn id(&self) -> TopicId {
        self.id
    }

    /// Fetch the topic row
    ///
    /// `Include::User` joins the owner and its current name into the same
    /// statement; `Include::Tags` fetches the tag set afterwards.
    #[instrument(skip(self, session), fields(topic_id = %self.id))]
    pub async fn load<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        includes: &[Include],
    ) -> DomainResult<()> {
        let mut query = Query::select(TOPIC_TABLE)
            .fields(["topics.*"])
            .filter("topics.ll_topicid", self.id.into_inner());
        if wants(includes, Include::User) {
            query = mappers::join_current_author(query, "users.id = topics.userid");
        }

        let row = session
            .first_row(query)
            .await?
            .ok_or(DomainError::TopicNotFound(self.id.into_inner()))?;
        self.apply_row(&row, "")?;
        if let Some(user) = self.user.as_deref_mut() {
            user.apply_row(&row, USER_PREFIX)?;
        }

        if wants(includes, Include::Tags) {
            self.load_tags(session).await?;
        }
        Ok(())
    }

    /// Fetch the tag set, replacing any cached one
    pub async fn load_tags<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<&[Tag]> {
        self.tags = None;
        self.tags(session).await
    }

    /// Tags on this topic, by name; fetched once and kept
    pub async fn tags<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<&[Tag]> {
        if self.tags.is_none() {
            let mut by_topic = tags_by_topic(session, &[self.id]).await?;
            self.tags = Some(by_topic.remove(&self.id).unwrap_or_default());
        }
        Ok(self.tags.as_deref().unwrap_or_default())
    }

    /// Every post in the topic, oldest first
    #[instrument(skip(self, session), fields(topic_id = %self.id))]
    pub async fn posts<C: Connector>(&self, session: &mut Session<C>) -> DomainResult<Vec<Post>> {
        let rows = session
            .fetch(
                Query::select("posts")
                    .filter("ll_topicid", self.id.into_inner())
                    .order("ll_messageid ASC")
                    .unbounded(),
            )
            .await?;
        rows.iter().map(Post::from_row).collect()
    }

    /// Users who posted here with their post counts, most posts first
    #[instrument(skip(self, session), fields(topic_id = %self.id))]
    pub async fn users<C: Connector>(
        &self,
        session: &mut Session<C>,
    ) -> DomainResult<Vec<TopicParticipant>> {
        let rows = session
            .fetch(
                Query::select("posts")
                    .fields(["userid", "COUNT(*) AS count"])
                    .filter("ll_topicid", self.id.into_inner())
                    .group(["userid"])
                    .order("count DESC")
                    .unbounded(),
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(TopicParticipant {
                    user: User::new(UserId::new(mappers::require_int(row, "", "userid")?)?),
                    posts: mappers::require_int(row, "", "count")?,
                })
            })
            .collect()
    }
}

/// Tag sets of several topics in one query, each ordered by tag name
///
/// Topics without tags are absent from the map.
#[instrument(skip(session, topics), fields(topics = topics.len()))]
pub async fn tags_by_topic<C: Connector>(
    session: &mut Session<C>,
    topics: &[TopicId],
) -> DomainResult<HashMap<TopicId, Vec<Tag>>> {
    if topics.is_empty() {
        return Ok(HashMap::new());
    }
    let ids: Vec<i64> = topics.iter().map(|id| id.into_inner()).collect();
    let rows = session
        .fetch(
            Query::select("tags_topics")
                .fields(["tags_topics.topic_id AS tagged_topic_id", "tags.*"])
                .inner_join(format!("{TAG_TABLE} ON tags.id = tags_topics.tag_id"))
                .filter("tags_topics.topic_id", ids)
                .order("tags.name ASC")
                .unbounded(),
        )
        .await?;

    let mut grouped: HashMap<TopicId, Vec<Tag>> = HashMap::new();
    for row in &rows {
        let topic = TopicId::new(mappers::require_int(row, "", "tagged_topic_id")?)?;
        grouped.entry(topic).or_default().push(Tag::from_row(row, "")?);
    }
    debug!(tagged = grouped.len(), "Resolved topic tags");
    Ok(grouped)
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Entity for Topic {
    const KIND: EntityKind = EntityKind::Topic;

    fn key(&self) -> String {
        self.id.to_string()
    }
}
