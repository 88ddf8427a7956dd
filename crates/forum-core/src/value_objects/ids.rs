//! Entity identities
//!
//! Every identity is validated when it is constructed, so an entity can never
//! exist with an id the store could not hold:
//! - topics and posts: positive integers
//! - users: non-negative integers (0 is the anonymous user)
//! - tags: non-empty names

use std::fmt;

use serde::Serialize;

use crate::error::{DomainError, DomainResult};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, min = $min:expr, invalid = $invalid:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw id
            pub fn new(id: i64) -> DomainResult<Self> {
                if id < $min {
                    return Err(DomainError::$invalid(id));
                }
                Ok(Self(id))
            }

            /// Get the inner i64 value
            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = DomainError;

            fn try_from(id: i64) -> DomainResult<Self> {
                Self::new(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Topic identity (`topics.ll_topicid`)
    TopicId, min = 1, invalid = InvalidTopic
);

numeric_id!(
    /// Post identity (`posts.ll_messageid`)
    PostId, min = 1, invalid = InvalidPost
);

numeric_id!(
    /// User identity (`users.id`); 0 is the anonymous user
    UserId, min = 0, invalid = InvalidUser
);

impl UserId {
    /// The anonymous user, which has no row in storage
    pub const ANONYMOUS: Self = Self(0);

    #[inline]
    pub const fn is_anonymous(self) -> bool {
        self.0 == 0
    }
}

/// Tag identity: tags are addressed by name, not by their numeric id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TagName(String);

impl TagName {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidTag(name));
        }
        Ok(Self(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_and_post_ids_must_be_positive() {
        assert!(TopicId::new(1).is_ok());
        assert!(matches!(TopicId::new(0), Err(DomainError::InvalidTopic(0))));
        assert!(matches!(PostId::new(-5), Err(DomainError::InvalidPost(-5))));
    }

    #[test]
    fn test_user_id_allows_anonymous() {
        let anon = UserId::new(0).unwrap();
        assert!(anon.is_anonymous());
        assert_eq!(anon, UserId::ANONYMOUS);
        assert!(matches!(UserId::new(-1), Err(DomainError::InvalidUser(-1))));
    }

    #[test]
    fn test_tag_name_rejects_blank() {
        assert!(TagName::new("LUE").is_ok());
        assert!(matches!(TagName::new("  "), Err(DomainError::InvalidTag(_))));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TopicId::new(42).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let tag = TagName::new("Anime").unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"Anime\"");
    }

    #[test]
    fn test_try_from_and_into() {
        let id = UserId::try_from(7).unwrap();
        assert_eq!(i64::from(id), 7);
        assert_eq!(id.to_string(), "7");
    }
}
