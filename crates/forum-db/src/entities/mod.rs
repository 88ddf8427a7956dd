//! Forum entities
//!
//! Entities are cheap to construct (identity only) and fill in as they are
//! loaded. Operations borrow the session rather than holding it, so an entity
//! can be serialized, compared or stored without dragging a connection along.
//! Attributes that have not been loaded are `None` and are left out of the
//! serialized form.

mod post;
mod tag;
mod topic;
mod user;

use std::fmt;
use std::str::FromStr;

use forum_core::{DomainError, DomainResult, EntityKind};
use serde::Serialize;

pub use post::Post;
pub use tag::{resolve_tag_ids, StaffMember, Tag};
pub use topic::{tags_by_topic, Topic, TopicParticipant};
pub use user::User;

/// Shared capability of every forum entity
pub trait Entity: Serialize {
    const KIND: EntityKind;

    /// Identity as shown in logs and error messages
    fn key(&self) -> String;

    /// Recursive plain-data form; unloaded attributes are omitted
    fn to_json(&self) -> DomainResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| {
            DomainError::InternalError(format!("cannot serialize {} {}: {e}", Self::KIND, self.key()))
        })
    }
}

/// Relations a load or search may resolve eagerly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Include {
    /// The owning user, joined in the same statement with its current name
    User,
    /// The owning topic, joined in the same statement
    Topic,
    /// The topic's tag set, fetched by a second query
    Tags,
}

impl Include {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Topic => "topic",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Include {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "topic" => Ok(Self::Topic),
            "tags" => Ok(Self::Tags),
            other => Err(DomainError::usage(format!("unknown include `{other}`"))),
        }
    }
}

pub(crate) fn wants(includes: &[Include], include: Include) -> bool {
    includes.contains(&include)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_parsing() {
        assert_eq!("user".parse::<Include>().unwrap(), Include::User);
        assert_eq!(" Tags ".parse::<Include>().unwrap(), Include::Tags);
        assert!("posts".parse::<Include>().unwrap_err().is_usage());
    }

    #[test]
    fn test_include_display_round_trips_names() {
        for include in [Include::User, Include::Topic, Include::Tags] {
            assert_eq!(include.to_string().parse::<Include>().unwrap(), include);
        }
    }
}
