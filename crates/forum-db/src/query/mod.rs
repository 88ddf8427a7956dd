//! Query specification, rendering, and dynamic values

mod builder;
mod value;

pub use builder::{JoinKind, Kind, Query, Statement, DEFAULT_LIMIT};
pub use value::{Param, Value};
