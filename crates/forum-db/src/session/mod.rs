//! Connection management

mod connector;
mod manager;
mod mysql;

pub use connector::{Connection, Connector, DriverError};
pub use manager::Session;
pub use mysql::{MySqlConnector, MySqlSessionConnection};
