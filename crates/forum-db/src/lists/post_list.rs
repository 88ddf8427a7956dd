//! Post search

use forum_core::{DomainResult, TopicId, UserId};
use tracing::instrument;

use crate::entities::{wants, Include, Post};
use crate::mappers::{self, POST_TABLE};
use crate::query::Query;
use crate::session::{Connector, Session};

use super::ListFilter;

/// Post search, newest first unless reordered
#[derive(Debug, Clone)]
pub struct PostList {
    filter: ListFilter,
    includes: Vec<Include>,
}

impl Default for PostList {
    fn default() -> Self {
        Self::new()
    }
}

impl PostList {
    pub fn new() -> Self {
        Self {
            filter: ListFilter::new("posts.date DESC"),
            includes: Vec::new(),
        }
    }

    pub fn user(mut self, user: UserId) -> Self {
        self.filter.user = Some(user);
        self
    }

    pub fn topic(mut self, topic: TopicId) -> Self {
        self.filter.topic = Some(topic);
        self
    }

    /// Replace the ordering with a literal ORDER BY expression
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.filter.order = Some(order.into());
        self
    }

    pub fn start(mut self, start: u64) -> Self {
        self.filter.start = start;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.filter.limit = limit;
        self
    }

    /// Relations to join into the search (`User`, `Topic`)
    pub fn include(mut self, include: Include) -> Self {
        if !self.includes.contains(&include) {
            self.includes.push(include);
        }
        self
    }

    /// Run the search, then number each post's page
    #[instrument(skip(self, session))]
    pub async fn search<C: Connector>(&self, session: &mut Session<C>) -> DomainResult<Vec<Post>> {
        let mut query = self.filter.apply(
            Query::select(POST_TABLE).fields(["posts.*"]),
            POST_TABLE,
            "ll_topicid",
        );
        if wants(&self.includes, Include::Topic) {
            query = mappers::join_topic(query, "topics.ll_topicid = posts.ll_topicid");
        }
        if wants(&self.includes, Include::User) {
            query = mappers::join_current_author(query, "users.id = posts.userid");
        }

        let rows = session.fetch(query).await?;
        let mut posts = rows.iter().map(Post::from_row).collect::<DomainResult<Vec<_>>>()?;

        // Page numbers need their own statements, so they run once the
        // result set has been drained.
        for post in &mut posts {
            post.compute_page(session).await?;
        }
        Ok(posts)
    }
}
