//! Domain errors - error types for the data-access core

use std::fmt;

use thiserror::Error;

/// Result type for data-access operations
pub type DomainResult<T> = Result<T, DomainError>;

/// The four entity kinds the core can load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Topic,
    Post,
    User,
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Topic => "topic",
            Self::Post => "post",
            Self::User => "user",
            Self::Tag => "tag",
        })
    }
}

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Topic not found: {0}")]
    TopicNotFound(i64),

    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    // =========================================================================
    // Invalid Identity Errors
    // =========================================================================
    #[error("Invalid topic id: {0}")]
    InvalidTopic(i64),

    #[error("Invalid post id: {0}")]
    InvalidPost(i64),

    #[error("Invalid user id: {0}")]
    InvalidUser(i64),

    #[error("Invalid tag name: {0:?}")]
    InvalidTag(String),

    // =========================================================================
    // Programmer Errors
    // =========================================================================
    #[error("Usage error: {0}")]
    UsageError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Create a usage error
    pub fn usage(msg: impl fmt::Display) -> Self {
        Self::UsageError(msg.to_string())
    }

    /// Get an error code string for boundary responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::TopicNotFound(_) | Self::InvalidTopic(_) => "UNKNOWN_TOPIC",
            Self::PostNotFound(_) | Self::InvalidPost(_) => "UNKNOWN_POST",
            Self::UserNotFound(_) | Self::InvalidUser(_) => "UNKNOWN_USER",
            Self::TagNotFound(_) | Self::InvalidTag(_) => "UNKNOWN_TAG",
            Self::UsageError(_) => "USAGE_ERROR",
            Self::ConnectionError(_) => "CONNECTION_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::MalformedRow(_) => "MALFORMED_ROW",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// The entity kind a not-found or invalid-identity error refers to
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::TopicNotFound(_) | Self::InvalidTopic(_) => Some(EntityKind::Topic),
            Self::PostNotFound(_) | Self::InvalidPost(_) => Some(EntityKind::Post),
            Self::UserNotFound(_) | Self::InvalidUser(_) => Some(EntityKind::User),
            Self::TagNotFound(_) | Self::InvalidTag(_) => Some(EntityKind::Tag),
            _ => None,
        }
    }

    /// Check if this is a "not found" error
    ///
    /// Invalid identities count: an id that can never exist is not found.
    pub fn is_not_found(&self) -> bool {
        self.entity_kind().is_some()
    }

    /// Check if this is a programmer error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UsageError(_))
    }

    /// Check if the session could not be (re-)established
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}
