//! User entity

use std::hash::{Hash, Hasher};

use forum_core::{
    DomainError, DomainResult, EntityKind, NameEntry, NameHistory, PostId, TopicId, UserId,
};
use serde::Serialize;
use tracing::instrument;

use crate::mappers::{self, USER_TABLE};
use crate::query::Query;
use crate::session::{Connector, Session};

use super::{Entity, Post, Topic};

/// A forum user; id 0 is the anonymous user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    id: UserId,
    /// Current display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    /// Name history, most recent first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<NameHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub im: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<Option<String>>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            names: None,
            created: None,
            last_active: None,
            good_tokens: None,
            bad_tokens: None,
            tokens: None,
            status: None,
            signature: None,
            quote: None,
            email: None,
            im: None,
            picture: None,
        }
    }

    /// Validate a raw id and construct
    pub fn from_id(id: i64) -> DomainResult<Self> {
        Ok(Self::new(UserId::new(id)?))
    }

    pub fn anonymous() -> Self {
        Self::new(UserId::ANONYMOUS)
    }

    #[inline]
    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_anonymous()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }

    /// Current display name, if one is known
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_ref().and_then(Option::as_deref)
    }

    /// Fetch the user row and its name history
    ///
    /// The anonymous user has no row; it gets zeroed counters and the fixed
    /// history `[("Human", no date)]` without touching storage.
    #[instrument(skip(self, session), fields(user_id = %self.id))]
    pub async fn load<C: Connector>(&mut self, session: &mut Session<C>) -> DomainResult<()> {
        if self.is_anonymous() {
            self.apply_anonymous();
            return Ok(());
        }

        let row = session
            .first_row(Query::select(USER_TABLE).filter("id", self.id.into_inner()))
            .await?
            .ok_or(DomainError::UserNotFound(self.id.into_inner()))?;
        self.apply_row(&row, "")?;

        let rows = session
            .fetch(
                Query::select("user_names")
                    .filter("user_id", self.id.into_inner())
                    .order("date DESC")
                    .unbounded(),
            )
            .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(date) = mappers::int(row, "", "date")? else {
                continue;
            };
            entries.push(NameEntry::new(
                mappers::text(row, "", "name").unwrap_or_default(),
                Some(date),
            ));
        }
        self.set_names(NameHistory::new(entries));
        Ok(())
    }

    fn apply_anonymous(&mut self) {
        self.created = Some(0);
        self.last_active = Some(0);
        self.good_tokens = Some(0);
        self.bad_tokens = Some(0);
        self.tokens = Some(0);
        self.status = Some(0);
        self.signature = Some(None);
        self.quote = Some(None);
        self.email = Some(None);
        self.im = Some(None);
        self.picture = Some(None);
        self.set_names(NameHistory::anonymous());
    }

    fn set_names(&mut self, names: NameHistory) {
        self.name = Some(Some(names.current().to_string()));
        self.names = Some(names);
    }

    /// Posts written by this user, newest first
    #[instrument(skip(self, session), fields(user_id = %self.id))]
    pub async fn posts<C: Connector>(&self, session: &mut Session<C>) -> DomainResult<Vec<Post>> {
        let ids = session
            .list(
                Query::select("posts")
                    .fields(["ll_messageid"])
                    .filter("userid", self.id.into_inner())
                    .order("date DESC")
                    .unbounded(),
                "ll_messageid",
            )
            .await?;
        ids.iter()
            .map(|id| Ok(Post::new(PostId::new(mappers::value_to_id(id)?)?)))
            .collect()
    }

    /// Topics started by this user, most recently active first
    #[instrument(skip(self, session), fields(user_id = %self.id))]
    pub async fn topics<C: Connector>(&self, session: &mut Session<C>) -> DomainResult<Vec<Topic>> {
        let ids = session
            .list(
                Query::select("topics")
                    .fields(["ll_topicid"])
                    .filter("userid", self.id.into_inner())
                    .order("lastPostTime DESC")
                    .unbounded(),
                "ll_topicid",
            )
            .await?;
        ids.iter()
            .map(|id| Ok(Topic::new(TopicId::new(mappers::value_to_id(id)?)?)))
            .collect()
    }

    /// Look up the user currently or formerly known by `name`
    ///
    /// The most recent holder of the name wins.
    #[instrument(skip(session))]
    pub async fn find_id_by_name<C: Connector>(
        session: &mut Session<C>,
        name: &str,
    ) -> DomainResult<Option<UserId>> {
        let found = session
            .first_value(
                Query::select("user_names")
                    .fields(["user_id"])
                    .filter("name", name)
                    .order("date DESC")
                    .limit(1),
            )
            .await?;
        found
            .map(|id| UserId::new(mappers::value_to_id(&id)?))
            .transpose()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn key(&self) -> String {
        self.id.to_string()
    }
}
