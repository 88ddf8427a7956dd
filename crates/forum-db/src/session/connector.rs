//! Driver seam
//!
//! A [`Connector`] knows the credentials and opens [`Connection`]s; the session
//! owns at most one connection at a time. Drivers classify their failures into
//! [`DriverError`] so the session can tell a lost connection from a bad statement.

use async_trait::async_trait;
use forum_core::DomainError;

use crate::query::Statement;
use crate::row::Row;

/// Failure reported by a driver
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// The handshake failed; nothing was established
    #[error("cannot connect: {0}")]
    Connect(String),

    /// The connection went away under a statement; worth one reconnect
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The statement itself failed
    #[error("{0}")]
    Statement(String),
}

impl DriverError {
    #[inline]
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

impl From<DriverError> for DomainError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Connect(msg) | DriverError::ConnectionLost(msg) => {
                DomainError::ConnectionError(msg)
            }
            DriverError::Statement(msg) => DomainError::DatabaseError(msg),
        }
    }
}

/// An open database connection
#[async_trait]
pub trait Connection: Send {
    /// Run a statement and drain every row it produces
    async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<Row>, DriverError>;

    /// Run a statement and report the affected row count
    async fn execute(&mut self, statement: &Statement) -> Result<u64, DriverError>;

    /// Release the connection
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Opens connections with stored credentials
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection;

    async fn connect(&self) -> Result<Self::Connection, DriverError>;
}
