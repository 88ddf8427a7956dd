//! Tag entity
//!
//! Tags are addressed by name. The numeric id is looked up on demand, and the
//! three relation sets and the staff list are each fetched at most once per
//! instance.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use forum_core::{DomainError, DomainResult, EntityKind, TagName, TopicId, UserId};
use serde::Serialize;
use tracing::instrument;

use crate::mappers::{self, TAG_TABLE, USER_PREFIX};
use crate::query::Query;
use crate::session::{Connector, Session};
use crate::tag_graph::Relation;

use super::{Entity, Topic, User};

/// A topic tag
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    name: TagName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inceptive: Option<i64>,
    #[serde(skip)]
    dependent: Option<Vec<Tag>>,
    #[serde(skip)]
    forbidden: Option<Vec<Tag>>,
    #[serde(skip)]
    related: Option<Vec<Tag>>,
    #[serde(skip)]
    staff: Option<Vec<StaffMember>>,
}

/// A user holding a role on a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffMember {
    pub role: i64,
    pub user: User,
}

impl Tag {
    pub fn new(name: TagName) -> Self {
        Self {
            name,
            id: None,
            description: None,
            access: None,
            participation: None,
            permanent: None,
            inceptive: None,
            dependent: None,
            forbidden: None,
            related: None,
            staff: None,
        }
    }

    /// Validate a raw name and construct
    pub fn from_name(name: impl Into<String>) -> DomainResult<Self> {
        Ok(Self::new(TagName::new(name)?))
    }

    #[inline]
    pub fn name(&self) -> &TagName {
        &self.name
    }

    /// The numeric id if it is already known
    pub fn known_id(&self) -> Option<i64> {
        self.id
    }

    /// Numeric id, looked up once by name
    #[instrument(skip(self, session), fields(tag = %self.name))]
    pub async fn id<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<i64> {
        if let Some(id) = self.id {
            return Ok(id);
        }
        let id = session
            .first_value(
                Query::select(TAG_TABLE)
                    .fields(["id"])
                    .filter("name", self.name.as_str()),
            )
            .await?
            .map(|value| mappers::value_to_id(&value))
            .transpose()?
            .ok_or_else(|| DomainError::TagNotFound(self.name.to_string()))?;
        self.id = Some(id);
        Ok(id)
    }

    /// Fetch the tag row
    #[instrument(skip(self, session), fields(tag = %self.name))]
    pub async fn load<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<()> {
        let row = session
            .first_row(Query::select(TAG_TABLE).filter("name", self.name.as_str()))
            .await?
            .ok_or_else(|| DomainError::TagNotFound(self.name.to_string()))?;
        self.apply_row(&row, "")
    }

    async fn ensure_id<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<i64> {
        if self.id.is_none() {
            self.load(session).await?;
        }
        self.id
            .ok_or_else(|| DomainError::MalformedRow(format!("tag `{}` has no id", self.name)))
    }

    /// Tags this tag requires
    pub async fn dependent<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<&[Tag]> {
        if self.dependent.is_none() {
            let tags = self.fetch_relation(session, Relation::Dependent).await?;
            self.dependent = Some(tags);
        }
        Ok(self.dependent.as_deref().unwrap_or_default())
    }

    /// Tags that may not appear alongside this tag
    pub async fn forbidden<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<&[Tag]> {
        if self.forbidden.is_none() {
            let tags = self.fetch_relation(session, Relation::Forbidden).await?;
            self.forbidden = Some(tags);
        }
        Ok(self.forbidden.as_deref().unwrap_or_default())
    }

    /// Tags suggested alongside this tag
    pub async fn related<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<&[Tag]> {
        if self.related.is_none() {
            let tags = self.fetch_relation(session, Relation::Related).await?;
            self.related = Some(tags);
        }
        Ok(self.related.as_deref().unwrap_or_default())
    }

    /// Users with a role on this tag, highest role first, then by name
    #[instrument(skip(self, session), fields(tag = %self.name))]
    pub async fn staff<C: Connector>(
        &mut self,
        session: &mut Session<C>,
    ) -> DomainResult<&[StaffMember]> {
        if self.staff.is_none() {
            let id = self.ensure_id(session).await?;
            let query = Query::select("tags_users")
                .fields(["tags_users.user_id", "tags_users.role"])
                .filter("tags_users.tag_id", id)
                .order("tags_users.role DESC, user__name ASC")
                .unbounded();
            let rows = session
                .fetch(mappers::join_current_author(
                    query,
                    "users.id = tags_users.user_id",
                ))
                .await?;

            let mut staff = Vec::with_capacity(rows.len());
            for row in &rows {
                let mut user = User::new(UserId::new(mappers::require_int(row, "", "user_id")?)?);
                user.apply_row(row, USER_PREFIX)?;
                staff.push(StaffMember {
                    role: mappers::require_int(row, "", "role")?,
                    user,
                });
            }
            self.staff = Some(staff);
        }
        Ok(self.staff.as_deref().unwrap_or_default())
    }

    /// Topics carrying this tag, most recently active first
    #[instrument(skip(self, session), fields(tag = %self.name))]
    pub async fn topics<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<Vec<Topic>> {
        let id = self.ensure_id(session).await?;
        let ids = session
            .list(
                Query::select("tags_topics")
                    .fields(["tags_topics.topic_id"])
                    .inner_join("topics ON topics.ll_topicid = tags_topics.topic_id")
                    .filter("tags_topics.tag_id", id)
                    .order("topics.lastPostTime DESC")
                    .unbounded(),
                "topic_id",
            )
            .await?;
        ids.iter()
            .map(|id| Ok(Topic::new(TopicId::new(mappers::value_to_id(id)?)?)))
            .collect()
    }

    /// Neighbours of this tag along one relation, ordered by name
    #[instrument(skip(self, session), fields(tag = %self.name))]
    pub(crate) async fn fetch_relation<C: Connector>(
        &mut self,
        session: &mut Session<C>,
        relation: Relation,
    ) -> DomainResult<Vec<Tag>> {
        let id = self.ensure_id(session).await?;
        let (table, target, source) = relation.columns();
        let rows = session
            .fetch(
                Query::select(table)
                    .fields(["tags.*"])
                    .inner_join(format!("{TAG_TABLE} ON tags.id = {table}.{target}"))
                    .filter(format!("{table}.{source}"), id)
                    .order("tags.name ASC")
                    .unbounded(),
            )
            .await?;
        rows.iter().map(|row| Tag::from_row(row, "")).collect()
    }
}

/// Numeric ids for a set of tag names, in the order given
///
/// Names match case-insensitively, as the `tags.name` collation does. Every
/// name must exist; the first missing one is reported as not found.
#[instrument(skip(session, names), fields(tags = names.len()))]
pub async fn resolve_tag_ids<C: Connector>(
    session: &mut Session<C>,
    names: &[TagName],
) -> DomainResult<Vec<i64>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let wanted: Vec<&str> = names.iter().map(TagName::as_str).collect();
    let rows = session
        .fetch(
            Query::select(TAG_TABLE)
                .fields(["id", "name"])
                .filter("name", wanted)
                .unbounded(),
        )
        .await?;

    let mut found = HashMap::with_capacity(rows.len());
    for row in &rows {
        let name = mappers::text(row, "", "name")
            .ok_or_else(|| DomainError::MalformedRow("tag row without a name".into()))?;
        found.insert(name.to_lowercase(), mappers::require_int(row, "", "id")?);
    }

    names
        .iter()
        .map(|name| {
            found
                .get(&name.as_str().to_lowercase())
                .copied()
                .ok_or_else(|| DomainError::TagNotFound(name.to_string()))
        })
        .collect()
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Entity for Tag {
    const KIND: EntityKind = EntityKind::Tag;

    fn key(&self) -> String {
        self.name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Value;
    use crate::row::Row;
    use crate::testing::{row, text, ScriptedConnector};

    fn tag_row(id: i64, name: &str) -> Row {
        row(&[
            ("id", Value::Int(id)),
            ("name", text(name)),
            ("description", text("About things")),
            ("access", Value::Int(1)),
            ("participation", Value::Int(2)),
            ("permanent", Value::Int(0)),
            ("inceptive", Value::Int(1)),
        ])
    }

    #[tokio::test]
    async fn test_load_maps_metadata() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![tag_row(4, "Anime")]);
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("Anime").unwrap();
        tag.load(&mut session).await.unwrap();

        assert_eq!(tag.known_id(), Some(4));
        assert_eq!(tag.description, Some(Some("About things".into())));
        assert_eq!(tag.participation, Some(2));
        assert_eq!(
            connector.statements()[0].sql,
            "SELECT * FROM tags WHERE name = ? LIMIT ?, ?"
        );
    }

    #[tokio::test]
    async fn test_dependent_is_fetched_once() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![tag_row(4, "Anime")]);
        connector.push_rows(vec![tag_row(1, "TV"), tag_row(2, "Japan")]);
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("Anime").unwrap();
        let first = tag.dependent(&mut session).await.unwrap().len();
        let second = tag.dependent(&mut session).await.unwrap().len();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        let statements = connector.statements();
        let relation_queries = statements
            .iter()
            .filter(|s| s.sql.contains("tags_dependent"))
            .count();
        assert_eq!(relation_queries, 1);
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1].sql,
            "SELECT tags.* FROM tags_dependent \
             INNER JOIN tags ON tags.id = tags_dependent.parent_tag_id \
             WHERE tags_dependent.child_tag_id = ? ORDER BY tags.name ASC"
        );
        assert_eq!(statements[1].params, vec![Value::Int(4)]);
    }

    #[tokio::test]
    async fn test_forbidden_and_related_use_their_tables() {
        let connector = ScriptedConnector::new();
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("Anime").unwrap();
        tag.id = Some(4);
        assert!(tag.forbidden(&mut session).await.unwrap().is_empty());
        assert!(tag.related(&mut session).await.unwrap().is_empty());
        assert!(tag.forbidden(&mut session).await.unwrap().is_empty());

        let statements = connector.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0]
            .sql
            .contains("INNER JOIN tags ON tags.id = tags_forbidden.forbidden_tag_id"));
        assert!(statements[0].sql.contains("WHERE tags_forbidden.tag_id = ?"));
        assert!(statements[1]
            .sql
            .contains("INNER JOIN tags ON tags.id = tags_related.parent_tag_id"));
    }

    #[tokio::test]
    async fn test_id_lookup_is_memoized() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![row(&[("id", Value::Int(12))])]);
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("LUE").unwrap();
        assert_eq!(tag.id(&mut session).await.unwrap(), 12);
        assert_eq!(tag.id(&mut session).await.unwrap(), 12);
        assert_eq!(connector.statements().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_not_found() {
        let connector = ScriptedConnector::new();
        let mut session = Session::new(connector);

        let err = Tag::from_name("Nope")
            .unwrap()
            .load(&mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::TagNotFound(ref n) if n == "Nope"));
        assert!(Tag::from_name("  ").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_staff_ordered_and_memoized() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![
            row(&[
                ("user_id", Value::Int(8)),
                ("role", Value::Int(3)),
                ("user__id", Value::Int(8)),
                ("user__name", text("Mod")),
            ]),
            row(&[
                ("user_id", Value::Int(2)),
                ("role", Value::Int(1)),
                ("user__id", Value::Int(2)),
                ("user__name", text("Helper")),
            ]),
        ]);
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("Anime").unwrap();
        tag.id = Some(4);
        let staff = tag.staff(&mut session).await.unwrap();
        assert_eq!(staff.len(), 2);
        assert_eq!(staff[0].role, 3);
        assert_eq!(staff[0].user.display_name(), Some("Mod"));

        tag.staff(&mut session).await.unwrap();
        let statements = connector.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0]
            .sql
            .ends_with("ORDER BY tags_users.role DESC, user__name ASC"));
    }

    #[tokio::test]
    async fn test_topics_most_recent_first() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![
            row(&[("topic_id", Value::Int(90))]),
            row(&[("topic_id", Value::Int(31))]),
        ]);
        let mut session = Session::new(connector.clone());

        let mut tag = Tag::from_name("Anime").unwrap();
        tag.id = Some(4);
        let topics = tag.topics(&mut session).await.unwrap();

        let ids: Vec<i64> = topics.iter().map(|t| t.id().into_inner()).collect();
        assert_eq!(ids, vec![90, 31]);
        assert!(connector.statements()[0]
            .sql
            .contains("ORDER BY topics.lastPostTime DESC"));
    }

    #[tokio::test]
    async fn test_resolve_tag_ids_keeps_request_order() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![
            row(&[("id", Value::Int(2)), ("name", text("LUE"))]),
            row(&[("id", Value::Int(1)), ("name", text("Anime"))]),
        ]);
        let mut session = Session::new(connector);
        let names = [TagName::new("Anime").unwrap(), TagName::new("LUE").unwrap()];

        let ids = resolve_tag_ids(&mut session, &names).await.unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_resolve_tag_ids_reports_missing_name() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![row(&[("id", Value::Int(1)), ("name", text("Anime"))])]);
        let mut session = Session::new(connector);
        let names = [TagName::new("Anime").unwrap(), TagName::new("Gone").unwrap()];

        let err = resolve_tag_ids(&mut session, &names).await.unwrap_err();
        assert!(matches!(err, DomainError::TagNotFound(ref n) if n == "Gone"));
    }

    #[tokio::test]
    async fn test_resolve_tag_ids_ignores_case_of_stored_name() {
        let connector = ScriptedConnector::new();
        connector.push_rows(vec![row(&[("id", Value::Int(7)), ("name", text("Anime"))])]);
        let mut session = Session::new(connector);
        let names = [TagName::new("anime").unwrap()];

        let ids = resolve_tag_ids(&mut session, &names).await.unwrap();
        assert_eq!(ids, vec![7]);
    }

    #[test]
    fn test_equality_by_name_and_json_skips_caches() {
        let mut tag = Tag::from_name("Anime").unwrap();
        tag.id = Some(4);
        tag.dependent = Some(vec![Tag::from_name("TV").unwrap()]);
        assert_eq!(tag, Tag::from_name("Anime").unwrap());
        assert_eq!(
            tag.to_json().unwrap(),
            serde_json::json!({"name": "Anime", "id": 4})
        );
    }
}
