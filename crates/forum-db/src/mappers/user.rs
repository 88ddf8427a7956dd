//! User row mapping

use forum_core::DomainResult;

use crate::entities::User;
use crate::query::Query;
use crate::row::Row;

use super::columns::{int, joined_fields, text_or_sentinel, NULL_SENTINEL};

pub const USER_TABLE: &str = "users";

/// Alias prefix of a joined author
pub const USER_PREFIX: &str = "user";

pub const USER_COLUMNS: &[&str] = &[
    "id",
    "created",
    "lastactive",
    "good_tokens",
    "bad_tokens",
    "contrib_tokens",
    "signature",
    "quote",
    "email",
    "im",
    "picture",
    "status",
];

/// Latest dated `user_names` entry of the joined user, at most one row
const CURRENT_NAME: &str = "SELECT user_names.name FROM user_names \
     WHERE user_names.user_id = users.id AND user_names.date IS NOT NULL \
     ORDER BY user_names.date DESC LIMIT 1";

/// Join the user matching `on` together with their current name
///
/// Adds at most one row per joined user and never removes the primary row: a
/// missing user or a user without dated names reads as null columns.
pub fn join_current_author(query: Query, on: &str) -> Query {
    query
        .fields(joined_fields(USER_TABLE, USER_PREFIX, USER_COLUMNS))
        .fields([format!("({CURRENT_NAME}) AS {USER_PREFIX}__name")])
        .left_join(format!("{USER_TABLE} ON {on}"))
}

impl User {
    /// Fill attributes from the row's `prefix` columns; absent columns are left alone
    pub(crate) fn apply_row(&mut self, row: &Row, prefix: &str) -> DomainResult<()> {
        macro_rules! ints {
            ($($field:ident <- $column:literal),*) => {
                $(if let Some(v) = int(row, prefix, $column)? {
                    self.$field = Some(v);
                })*
            };
        }
        macro_rules! profile {
            ($($field:ident),*) => {
                $(if let Some(v) = text_or_sentinel(row, prefix, stringify!($field), NULL_SENTINEL) {
                    self.$field = Some(v);
                })*
            };
        }

        ints!(
            created <- "created",
            last_active <- "lastactive",
            good_tokens <- "good_tokens",
            bad_tokens <- "bad_tokens",
            tokens <- "contrib_tokens",
            status <- "status"
        );
        profile!(signature, quote, email, im, picture, name);
        Ok(())
    }
}
