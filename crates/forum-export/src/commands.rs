//! Command-line surface and dispatch

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use forum_common::{AppError, AppResult};
use forum_core::{DomainResult, TagName, TopicId, UserId};
use forum_db::{
    Connector, Entity, Include, Post, PostList, Session, Tag, TagGraph, TagMatch, Topic,
    TopicList, User,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

#[derive(Parser, Debug)]
#[command(
    name = "forum-export",
    author,
    version,
    about = "Load forum topics, posts, users and tags and print them as JSON"
)]
pub struct Cli {
    /// Offset into list results
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Maximum list results; out-of-range values fall back to the configured maximum
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// One topic
    Topic {
        id: i64,
        /// Relations to load alongside (user, tags)
        #[arg(long, value_delimiter = ',')]
        include: Vec<Include>,
    },
    /// Every post in a topic, oldest first
    TopicPosts { id: i64 },
    /// Users who posted in a topic, with their post counts
    TopicUsers { id: i64 },
    /// Search topics
    Topics(TopicsArgs),
    /// One post with its page number
    Post {
        id: i64,
        /// Relations to load alongside (user, topic)
        #[arg(long, value_delimiter = ',')]
        include: Vec<Include>,
    },
    /// Search posts
    Posts(PostsArgs),
    /// One user with name history
    User { id: i64 },
    /// Posts written by a user, newest first
    UserPosts { id: i64 },
    /// Topics started by a user, most recently active first
    UserTopics { id: i64 },
    /// Look a user up by current or former name
    UserByName { name: String },
    /// One tag
    Tag {
        name: String,
        /// Also resolve dependent, forbidden and related tags plus staff
        #[arg(long)]
        relations: bool,
    },
    /// Topics carrying a tag
    TagTopics { name: String },
    /// Check a proposed tag set for unmet requirements and forbidden pairs
    TagCheck {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct TopicsArgs {
    /// Only topics started by this user
    #[arg(long)]
    user: Option<i64>,
    /// Require a tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Drop topics carrying a tag (repeatable)
    #[arg(long = "exclude-tag")]
    exclude_tags: Vec<String>,
    /// How several --tag values combine (all, any)
    #[arg(long = "match", default_value = "all")]
    tag_match: TagMatch,
    /// Full-text query over titles
    #[arg(long)]
    query: Option<String>,
    /// ORDER BY expression
    #[arg(long)]
    order: Option<String>,
    #[arg(long, value_delimiter = ',')]
    include: Vec<Include>,
}

#[derive(Args, Debug)]
pub struct PostsArgs {
    #[arg(long)]
    user: Option<i64>,
    #[arg(long)]
    topic: Option<i64>,
    /// ORDER BY expression
    #[arg(long)]
    order: Option<String>,
    #[arg(long, value_delimiter = ',')]
    include: Vec<Include>,
}

/// Clamped pagination for list commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub start: u64,
    pub limit: u64,
}

impl TopicsArgs {
    fn into_list(self, paging: Paging) -> DomainResult<TopicList> {
        let mut list = TopicList::new()
            .start(paging.start)
            .limit(paging.limit)
            .tag_match(self.tag_match)
            .tags(tag_names(self.tags)?);
        if let Some(user) = self.user {
            list = list.user(UserId::new(user)?);
        }
        for tag in tag_names(self.exclude_tags)? {
            list = list.exclude_tag(tag);
        }
        if let Some(text) = self.query {
            list = list.query(text);
        }
        if let Some(order) = self.order {
            list = list.order(order);
        }
        for include in self.include {
            list = list.include(include);
        }
        Ok(list)
    }
}

impl PostsArgs {
    fn into_list(self, paging: Paging) -> DomainResult<PostList> {
        let mut list = PostList::new().start(paging.start).limit(paging.limit);
        if let Some(user) = self.user {
            list = list.user(UserId::new(user)?);
        }
        if let Some(topic) = self.topic {
            list = list.topic(TopicId::new(topic)?);
        }
        if let Some(order) = self.order {
            list = list.order(order);
        }
        for include in self.include {
            list = list.include(include);
        }
        Ok(list)
    }
}

fn tag_names(raw: Vec<String>) -> DomainResult<Vec<TagName>> {
    raw.into_iter().map(TagName::new).collect()
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value)
        .context("failed to serialize export body")
        .map_err(AppError::internal)
}

/// `{"<key>": [...]}` around the serialized entities
fn envelope<E: Entity>(key: &str, items: &[E]) -> AppResult<Value> {
    let items = items
        .iter()
        .map(Entity::to_json)
        .collect::<DomainResult<Vec<_>>>()?;
    let mut body = Map::new();
    body.insert(key.to_string(), Value::Array(items));
    Ok(Value::Object(body))
}

fn tag_name_list(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(|tag| tag.name().to_string()).collect()
}

/// Run one command against the session and build the response body
#[instrument(skip(session))]
pub async fn execute<C: Connector>(
    command: Command,
    session: &mut Session<C>,
    paging: Paging,
) -> AppResult<Value> {
    match command {
        Command::Topic { id, include } => {
            let mut topic = Topic::from_id(id)?;
            topic.load(session, &include).await?;
            Ok(topic.to_json()?)
        }
        Command::TopicPosts { id } => {
            let posts = Topic::from_id(id)?.posts(session).await?;
            envelope("posts", &posts)
        }
        Command::TopicUsers { id } => {
            let users = Topic::from_id(id)?.users(session).await?;
            Ok(json!({ "users": to_value(&users)? }))
        }
        Command::Topics(args) => {
            let topics = args.into_list(paging)?.search(session).await?;
            envelope("topics", &topics)
        }
        Command::Post { id, include } => {
            let mut post = Post::from_id(id)?;
            post.load(session, &include).await?;
            Ok(post.to_json()?)
        }
        Command::Posts(args) => {
            let posts = args.into_list(paging)?.search(session).await?;
            envelope("posts", &posts)
        }
        Command::User { id } => {
            let mut user = User::from_id(id)?;
            user.load(session).await?;
            Ok(user.to_json()?)
        }
        Command::UserPosts { id } => {
            let posts = User::from_id(id)?.posts(session).await?;
            envelope("posts", &posts)
        }
        Command::UserTopics { id } => {
            let topics = User::from_id(id)?.topics(session).await?;
            envelope("topics", &topics)
        }
        Command::UserByName { name } => {
            let id = User::find_id_by_name(session, &name)
                .await?
                .ok_or_else(|| AppError::not_found(format!("user named {name}")))?;
            let mut user = User::new(id);
            user.load(session).await?;
            Ok(user.to_json()?)
        }
        Command::Tag { name, relations } => {
            let mut tag = Tag::from_name(name)?;
            tag.load(session).await?;
            let mut body = tag.to_json()?;
            if relations {
                let dependent = tag_name_list(tag.dependent(session).await?);
                let forbidden = tag_name_list(tag.forbidden(session).await?);
                let related = tag_name_list(tag.related(session).await?);
                let staff = to_value(tag.staff(session).await?)?;
                if let Value::Object(fields) = &mut body {
                    fields.insert("dependent".into(), json!(dependent));
                    fields.insert("forbidden".into(), json!(forbidden));
                    fields.insert("related".into(), json!(related));
                    fields.insert("staff".into(), staff);
                }
            }
            Ok(body)
        }
        Command::TagTopics { name } => {
            let topics = Tag::from_name(name)?.topics(session).await?;
            envelope("topics", &topics)
        }
        Command::TagCheck { names } => {
            let names = tag_names(names)?;
            let report = TagGraph::new().check(session, &names).await?;
            let mut body = to_value(&report)?;
            if let Value::Object(fields) = &mut body {
                fields.insert("valid".into(), json!(report.is_valid()));
            }
            Ok(body)
        }
    }
}
