//! Topic search

use std::fmt;
use std::str::FromStr;

use forum_core::{DomainError, DomainResult, TagName, TopicId, UserId};
use tracing::{debug, instrument};

use crate::entities::{resolve_tag_ids, tags_by_topic, wants, Include, Topic};
use crate::mappers::{self, TOPIC_TABLE, USER_PREFIX};
use crate::query::{Query, Value};
use crate::session::{Connector, Session};

use super::ListFilter;

/// How several include tags combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMatch {
    /// A topic must carry every include tag
    #[default]
    All,
    /// A topic must carry at least one include tag
    Any,
}

impl fmt::Display for TagMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Any => "any",
        })
    }
}

impl FromStr for TagMatch {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Ok(Self::All),
            "any" | "or" => Ok(Self::Any),
            other => Err(DomainError::usage(format!("unknown tag match mode `{other}`"))),
        }
    }
}

/// Topic search, most recently active first unless reordered
#[derive(Debug, Clone)]
pub struct TopicList {
    filter: ListFilter,
    include_tags: Vec<TagName>,
    exclude_tags: Vec<TagName>,
    tag_match: TagMatch,
    text: Option<String>,
    includes: Vec<Include>,
}

impl Default for TopicList {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicList {
    pub fn new() -> Self {
        Self {
            filter: ListFilter::new("topics.lastPostTime DESC"),
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            tag_match: TagMatch::default(),
            text: None,
            includes: Vec::new(),
        }
    }

    /// Only topics started by `user`
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

    pub fn include_tag(mut self, tag: TagName) -> Self {
        self.include_tags.push(tag);
        self
    }

    /// Replace the include tags
    pub fn tags(mut self, tags: Vec<TagName>) -> Self {
        self.include_tags = tags;
        self
    }

    /// Drop topics carrying `tag`
    pub fn exclude_tag(mut self, tag: TagName) -> Self {
        self.exclude_tags.push(tag);
        self
    }

    pub fn tag_match(mut self, mode: TagMatch) -> Self {
        self.tag_match = mode;
        self
    }

    /// Boolean-mode full-text query over topic titles
    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Relations to resolve for every result (`User`, `Tags`)
    pub fn include(mut self, include: Include) -> Self {
        if !self.includes.contains(&include) {
            self.includes.push(include);
        }
        self
    }

    /// Run the search
    ///
    /// Exclude tags are applied to the fetched page, so a page can come back
    /// shorter than the limit.
    #[instrument(skip(self, session), fields(
        include_tags = self.include_tags.len(),
        exclude_tags = self.exclude_tags.len(),
        tag_match = %self.tag_match,
    ))]
    pub async fn search<C: Connector>(&self, session: &mut Session<C>) -> DomainResult<Vec<Topic>> {
        let mut query = self.filter.apply(
            Query::select(TOPIC_TABLE).fields(["topics.*"]),
            TOPIC_TABLE,
            "ll_topicid",
        );

        if !self.include_tags.is_empty() {
            let mut ids = resolve_tag_ids(session, &self.include_tags).await?;
            ids.sort_unstable();
            ids.dedup();
            query = self.restrict_to_tags(query, &ids);
        }
        if let Some(text) = &self.text {
            query = query.matches(["topics.title"], text.clone());
        }
        let with_author = wants(&self.includes, Include::User);
        if with_author {
            query = mappers::join_current_author(query, "users.id = topics.userid");
        }

        let rows = session.fetch(query).await?;
        let mut topics = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut topic = Topic::from_row(row, "")?;
            if with_author {
                if let Some(user) = topic.user.as_deref_mut() {
                    user.apply_row(row, USER_PREFIX)?;
                }
            }
            topics.push(topic);
        }

        if wants(&self.includes, Include::Tags) || !self.exclude_tags.is_empty() {
            let ids: Vec<TopicId> = topics.iter().map(Topic::id).collect();
            let mut tagged = tags_by_topic(session, &ids).await?;
            for topic in &mut topics {
                topic.tags = Some(tagged.remove(&topic.id()).unwrap_or_default());
            }
        }

        if !self.exclude_tags.is_empty() {
            let before = topics.len();
            topics.retain(|topic| {
                !topic
                    .tags
                    .iter()
                    .flatten()
                    .any(|tag| self.exclude_tags.contains(tag.name()))
            });
            debug!(dropped = before - topics.len(), "Applied exclude tags");
        }

        Ok(topics)
    }

    /// Keep topics whose tag set matches the include tags under the match mode
    fn restrict_to_tags(&self, query: Query, tag_ids: &[i64]) -> Query {
        let slots = vec!["?"; tag_ids.len()].join(", ");
        let mut params: Vec<Value> = tag_ids.iter().copied().map(Value::from).collect();
        let subquery = match self.tag_match {
            TagMatch::All => {
                params.push(Value::from(tag_ids.len() as i64));
                format!(
                    "SELECT tags_topics.topic_id FROM tags_topics \
                     WHERE tags_topics.tag_id IN ({slots}) GROUP BY tags_topics.topic_id \
                     HAVING COUNT(DISTINCT tags_topics.tag_id) = ?"
                )
            }
            TagMatch::Any => format!(
                "SELECT tags_topics.topic_id FROM tags_topics \
                 WHERE tags_topics.tag_id IN ({slots}) GROUP BY tags_topics.topic_id"
            ),
        };
        query.where_bound(format!("topics.ll_topicid IN ({subquery})"), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use crate::testing::{row, text, ScriptedConnector};

    fn name(s: &str) -> TagName {
        TagName::new(s).unwrap()
    }

    fn topic_row(id: i64, owner: i64) -> Row {
        row(&[
            ("ll_topicid", Value::Int(id)),
            ("title", text(&format!("Topic {id}"))),
            ("postCount", Value::Int(1)),
            ("lastPostTime", Value::Int(1_000 - id)),
            ("userid", Value::Int(owner)),
        ])
    }

    fn tagging(topic: i64, tag_id: i64, tag: &str) -> Row {
        row(&[
            ("tagged_topic_id", Value::Int(topic)),
            ("id", Value::Int(tag_id)),
            ("name", text(tag)),
        ])
    }

    fn tag_ids(pairs: &[(i64, &str)]) -> Vec<Row> {
        pairs
            .iter()
            .map(|(id, n)| row(&[("id", Value::Int(*id)), ("name", text(n))]))
            .collect()
    }

    #[tokio::test]
    async fn test_default_search() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![topic_row(2, 5), topic_row(1, 6)]);
        let mut session = Session::new(connector.clone());

        let topics = TopicList::new().search(&mut session).await.unwrap();

        assert_eq!(topics.len(), 2);
        assert!(topics[0].tags.is_none());
        let statements = connector.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "SELECT topics.* FROM topics ORDER BY topics.lastPostTime DESC LIMIT ?, ?"
        );
        assert_eq!(statements[0].params, vec![Value::Int(0), Value::Int(50)]);
    }

    #[tokio::test]
    async fn test_all_mode_requires_every_tag() {
        let connector = ScriptedConnector::new();
        connector.push_rows(tag_ids(&[(7, "Anime"), (3, "LUE")]));
        connector.push_rows(vec![topic_row(1, 5)]);
        let mut session = Session::new(connector.clone());

        TopicList::new()
            .include_tag(name("Anime"))
            .include_tag(name("LUE"))
            .search(&mut session)
            .await
            .unwrap();

        let statement = &connector.statements()[1];
        assert!(statement.sql.contains(
            "topics.ll_topicid IN (SELECT tags_topics.topic_id FROM tags_topics \
             WHERE tags_topics.tag_id IN (?, ?) GROUP BY tags_topics.topic_id \
             HAVING COUNT(DISTINCT tags_topics.tag_id) = ?)"
        ));
        assert_eq!(
            statement.params,
            vec![
                Value::Int(3),
                Value::Int(7),
                Value::Int(2),
                Value::Int(0),
                Value::Int(50)
            ]
        );
    }

    #[tokio::test]
    async fn test_any_mode_requires_one_tag() {
        let connector = ScriptedConnector::new();
        connector.push_rows(tag_ids(&[(7, "Anime"), (3, "LUE")]));
        let mut session = Session::new(connector.clone());

        TopicList::new()
            .tags(vec![name("Anime"), name("LUE")])
            .tag_match(TagMatch::Any)
            .search(&mut session)
            .await
            .unwrap();

        let statement = &connector.statements()[1];
        assert!(statement.sql.contains(
            "WHERE tags_topics.tag_id IN (?, ?) GROUP BY tags_topics.topic_id)"
        ));
        assert!(!statement.sql.contains("HAVING"));
        assert_eq!(statement.params.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_include_tag_is_not_found() {
        let connector = ScriptedConnector::new();
        connector.push_rows(tag_ids(&[(7, "Anime")]));
        let mut session = Session::new(connector.clone());

        let err = TopicList::new()
            .tags(vec![name("Anime"), name("Missing")])
            .search(&mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::TagNotFound(ref n) if n == "Missing"));
        assert_eq!(connector.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_exclude_tags_drop_topics_after_fetch() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![topic_row(3, 1), topic_row(2, 1), topic_row(1, 1)]);
        connector.push_rows(vec![
            tagging(3, 7, "Anime"),
            tagging(2, 9, "Spoilers"),
            tagging(2, 7, "Anime"),
        ]);
        let mut session = Session::new(connector.clone());

        let topics = TopicList::new()
            .exclude_tag(name("Spoilers"))
            .search(&mut session)
            .await
            .unwrap();

        let ids: Vec<i64> = topics.iter().map(|t| t.id().into_inner()).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(topics[1].tags.as_deref(), Some(&[][..]));
        assert_eq!(connector.statements().len(), 2);
    }

    #[tokio::test]
    async fn test_query_user_and_author_include() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![row(&[
            ("ll_topicid", Value::Int(4)),
            ("userid", Value::Int(6)),
            ("user__id", Value::Int(6)),
            ("user__name", text("Eve")),
        ])]);
        let mut session = Session::new(connector.clone());

        let topics = TopicList::new()
            .user(UserId::new(6).unwrap())
            .query("+hello -world")
            .include(Include::User)
            .start(10)
            .limit(20)
            .search(&mut session)
            .await
            .unwrap();

        assert_eq!(
            topics[0].user.as_ref().unwrap().display_name(),
            Some("Eve")
        );
        let statement = &connector.statements()[0];
        assert!(statement.sql.contains(
            "WHERE topics.userid = ? AND MATCH(topics.title) AGAINST(? IN BOOLEAN MODE) \
             ORDER BY"
        ));
        assert_eq!(
            statement.params,
            vec![
                Value::Int(6),
                Value::Text("+hello -world".into()),
                Value::Int(10),
                Value::Int(20)
            ]
        );
    }

    #[tokio::test]
    async fn test_author_include_keeps_authorless_topics() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![topic_row(2, 5), topic_row(1, 6)]);
        connector.push_rows(vec![
            row(&[
                ("ll_topicid", Value::Int(2)),
                ("userid", Value::Int(5)),
                ("user__id", Value::Null),
                ("user__name", Value::Null),
            ]),
            row(&[
                ("ll_topicid", Value::Int(1)),
                ("userid", Value::Int(6)),
                ("user__id", Value::Int(6)),
                ("user__name", text("Eve")),
            ]),
        ]);
        let mut session = Session::new(connector.clone());
        let list = TopicList::new().user(UserId::new(5).unwrap());

        let plain = list.search(&mut session).await.unwrap();
        let authored = list
            .include(Include::User)
            .search(&mut session)
            .await
            .unwrap();

        assert_eq!(plain.len(), authored.len());
        let missing = authored[0].user.as_ref().unwrap();
        assert_eq!(missing.id().into_inner(), 5);
        assert_eq!(missing.display_name(), None);
        assert_eq!(authored[1].user.as_ref().unwrap().display_name(), Some("Eve"));

        let statements = connector.statements();
        let tail = |sql: &str| sql[sql.rfind(" WHERE ").unwrap()..].to_string();
        assert_eq!(tail(&statements[0].sql), tail(&statements[1].sql));
        assert_eq!(statements[0].params, statements[1].params);
    }

    #[tokio::test]
    async fn test_tags_include_uses_one_query() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![topic_row(2, 1), topic_row(1, 1)]);
        connector.push_rows(vec![tagging(1, 7, "Anime")]);
        let mut session = Session::new(connector.clone());

        let topics = TopicList::new()
            .include(Include::Tags)
            .search(&mut session)
            .await
            .unwrap();

        assert_eq!(topics[0].tags.as_ref().map(Vec::len), Some(0));
        assert_eq!(topics[1].tags.as_ref().map(Vec::len), Some(1));
        assert_eq!(connector.statements().len(), 2);
    }

    #[test]
    fn test_tag_match_parsing() {
        assert_eq!("AND".parse::<TagMatch>().unwrap(), TagMatch::All);
        assert_eq!("any".parse::<TagMatch>().unwrap(), TagMatch::Any);
        assert!("some".parse::<TagMatch>().unwrap_err().is_usage());
        assert_eq!(TagMatch::default(), TagMatch::All);
    }
}
