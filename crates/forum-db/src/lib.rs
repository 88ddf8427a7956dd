//! # forum-db
//!
//! Data-access layer for the forum, backed by MySQL via SQLx.
//!
//! ## Overview
//!
//! - A session-scoped connection manager that reconnects once on a lost link
//! - A fluent query builder rendering parameterized MySQL statements
//! - Materializers shaping result rows into scalars, lists and maps
//! - Lazily loaded entities (topics, posts, users, tags) with memoized relations
//! - Topic and post searches
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forum_common::AppConfig;
//! use forum_db::{Entity, Include, MySqlConnector, Session, Topic};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let mut session = Session::new(MySqlConnector::new(&config.database));
//!
//!     let mut topic = Topic::from_id(42)?;
//!     topic.load(&mut session, &[Include::User, Include::Tags]).await?;
//!     println!("{}", topic.to_json()?);
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod entities;
pub mod lists;
pub mod mappers;
pub mod materialize;
pub mod query;
pub mod row;
pub mod session;
pub mod tag_graph;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use entities::{Entity, Include, Post, StaffMember, Tag, Topic, TopicParticipant, User};
pub use lists::{PostList, TagMatch, TopicList};
pub use query::{JoinKind, Kind, Param, Query, Statement, Value, DEFAULT_LIMIT};
pub use row::Row;
pub use session::{Connection, Connector, DriverError, MySqlConnector, Session};
pub use tag_graph::{Relation, TagGraph, TagSetReport};
