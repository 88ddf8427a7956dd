//! Row to entity mappers
//!
//! Each entity module declares its table, its storage columns and how a row
//! read through an alias prefix becomes entity attributes:
//! - `apply_row`: fill attributes from whichever mapped columns the row carries
//! - `from_row`: construct and fill in one step
//! - `join_*`: add the joins and aliased fields that eager-load a relation

mod columns;
mod post;
mod tag;
mod topic;
mod user;

pub use columns::{
    column_name, has_column, int, joined_fields, require_int, text, text_or_sentinel,
    NO_SIGNATURE_SENTINEL, NULL_SENTINEL, PREFIX_SEPARATOR,
};
pub use post::POST_TABLE;
pub use tag::TAG_TABLE;
pub use topic::{join_topic, TOPIC_COLUMNS, TOPIC_PREFIX, TOPIC_TABLE};
pub use user::{join_current_author, USER_COLUMNS, USER_PREFIX, USER_TABLE};

use forum_core::{DomainError, DomainResult};

use crate::query::Value;

/// Integer id from a projected value
pub fn value_to_id(value: &Value) -> DomainResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| DomainError::MalformedRow(format!("expected an integer id, got {value:?}")))
}
