//! Collection searches over topics and posts

mod post_list;
mod topic_list;

pub use post_list::PostList;
pub use topic_list::{TagMatch, TopicList};

use forum_core::{TopicId, UserId};

use crate::query::{Query, DEFAULT_LIMIT};

/// Filter state shared by every list
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListFilter {
    pub user: Option<UserId>,
    pub topic: Option<TopicId>,
    pub order: Option<String>,
    pub start: u64,
    pub limit: u64,
}

impl ListFilter {
    pub fn new(order: &str) -> Self {
        Self {
            user: None,
            topic: None,
            order: Some(order.to_string()),
            start: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Restrict, order and paginate `query` over `table`
    pub fn apply(&self, query: Query, table: &str, topic_column: &str) -> Query {
        let mut query = query.start(self.start).limit(self.limit);
        if let Some(user) = self.user {
            query = query.filter(format!("{table}.userid"), user.into_inner());
        }
        if let Some(topic) = self.topic {
            query = query.filter(format!("{table}.{topic_column}"), topic.into_inner());
        }
        if let Some(order) = &self.order {
            query = query.order(order.clone());
        }
        query
    }
}
