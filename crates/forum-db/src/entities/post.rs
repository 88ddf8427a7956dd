//! Post entity

use std::hash::{Hash, Hasher};

use forum_core::{page_for_preceding, DomainError, DomainResult, EntityKind, PostId};
use serde::Serialize;
use tracing::instrument;

use crate::mappers::{self, POST_TABLE};
use crate::query::Query;
use crate::session::{Connector, Session};

use super::{wants, Entity, Include, Topic, User};

/// A single post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    id: PostId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    /// Raw body text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Box<Topic>>,
    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    /// 1-based page of the topic this post falls on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Post {
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            date: None,
            html: None,
            sig: None,
            topic: None,
            user: None,
            page: None,
        }
    }

    /// Validate a raw id and construct
    pub fn from_id(id: i64) -> DomainResult<Self> {
        Ok(Self::new(PostId::new(id)?))
    }

    #[inline]
    pub fn id(&self) -> PostId {
        self.id
    }

    /// Whether the body contains `needle`; an unloaded body contains nothing
    pub fn contains(&self, needle: &str) -> bool {
        self.html.as_deref().is_some_and(|html| html.contains(needle))
    }

    /// Fetch the post row, then its page number
    ///
    /// `Include::Topic` and `Include::User` join the topic and the author
    /// (with current name) into the primary statement.
    #[instrument(skip(self, session), fields(post_id = %self.id))]
    pub async fn load<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        includes: &[Include],
    ) -> DomainResult<()> {
        self.fetch_primary(session, includes).await?;
        self.compute_page(session).await?;
        Ok(())
    }

    /// Page number, loading the post first if its topic is not yet known
    pub async fn page<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<u32> {
        if let Some(page) = self.page {
            return Ok(page);
        }
        if self.topic.is_none() {
            self.fetch_primary(session, &[]).await?;
        }
        self.compute_page(session).await
    }

    async fn fetch_primary<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        includes: &[Include],
    ) -> DomainResult<()> {
        let mut query = Query::select(POST_TABLE)
            .fields(["posts.*"])
            .filter("posts.ll_messageid", self.id.into_inner());
        if wants(includes, Include::Topic) {
            query = mappers::join_topic(query, "topics.ll_topicid = posts.ll_topicid");
        }
        if wants(includes, Include::User) {
            query = mappers::join_current_author(query, "users.id = posts.userid");
        }

        let row = session
            .first_row(query)
            .await?
            .ok_or(DomainError::PostNotFound(self.id.into_inner()))?;
        self.apply_row(&row)
    }

    /// Count earlier posts in the same topic and derive the page
    pub(crate) async fn compute_page<C: Connector>(
        &mut self,
        session: &mut Session<C>,
    ) -> DomainResult<u32> {
        let topic = self
            .topic
            .as_ref()
            .map(|topic| topic.id())
            .ok_or_else(|| DomainError::usage("page requested before the post's topic is known"))?;

        let count = session
            .first_value(
                Query::select(POST_TABLE)
                    .fields(["COUNT(*)"])
                    .where_bound("ll_messageid < ?", self.id.into_inner())
                    .filter("ll_topicid", topic.into_inner()),
            )
            .await?
            .ok_or_else(|| DomainError::MalformedRow("post count returned no row".into()))?;
        let preceding = count.as_i64().ok_or_else(|| {
            DomainError::MalformedRow(format!("post count is not an integer: {count:?}"))
        })?;

        let page = page_for_preceding(preceding);
        self.page = Some(page);
        Ok(page)
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Post {}

impl Hash for Post {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn key(&self) -> String {
        self.id.to_string()
    }
}
