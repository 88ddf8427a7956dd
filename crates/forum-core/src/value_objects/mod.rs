//! Value objects - immutable types that represent forum concepts

mod ids;
mod names;
mod page;

pub use ids::{PostId, TagName, TopicId, UserId};
pub use names::{NameEntry, NameHistory, ANONYMOUS_NAME};
pub use page::{page_for_preceding, POSTS_PER_PAGE};
