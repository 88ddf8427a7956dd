//! # forum-core
//!
//! Domain layer for the forum data-access core: entity identities, the forum's
//! fixed rules (page size, name history), and the error taxonomy shared by every
//! other crate. It has no dependency on the database driver.

pub mod error;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::{DomainError, DomainResult, EntityKind};
pub use value_objects::{
    page_for_preceding, NameEntry, NameHistory, PostId, TagName, TopicId, UserId,
    ANONYMOUS_NAME, POSTS_PER_PAGE,
};
