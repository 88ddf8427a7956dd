//! Session-scoped connection manager
//!
//! One [`Session`] serves one logical request. It connects lazily, and when a
//! statement fails because the connection was lost it reconnects once and
//! retries that statement once. A second failure is returned to the caller.

use std::collections::HashMap;

use forum_core::{DomainError, DomainResult};
use tracing::{debug, info, instrument, warn};

use crate::materialize;
use crate::query::{Query, Statement, Value};
use crate::row::Row;

use super::connector::{Connection, Connector, DriverError};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Fetch,
    Execute,
}

enum Outcome {
    Rows(Vec<Row>),
    Affected(u64),
}

/// One live connection per logical session
pub struct Session<C: Connector> {
    connector: C,
    conn: Option<C::Connection>,
}

impl<C: Connector> Session<C> {
    /// Create a session; no connection is opened until first use
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            conn: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Open a fresh connection, replacing any cached one
    ///
    /// Handshake failures surface as `ConnectionError`; there is no retry here.
    pub async fn connect(&mut self) -> DomainResult<()> {
        self.conn = None;
        let conn = self.connector.connect().await.map_err(|e| {
            warn!(error = %e, "Database connection failed");
            DomainError::ConnectionError(e.to_string())
        })?;
        info!("Database connection established");
        self.conn = Some(conn);
        Ok(())
    }

    /// The live connection, connecting first if there is none
    pub async fn cursor(&mut self) -> DomainResult<&mut C::Connection> {
        if self.conn.is_none() {
            self.connect().await?;
        }
        self.conn
            .as_mut()
            .ok_or_else(|| DomainError::ConnectionError("no connection after connect".into()))
    }

    /// Release the connection; the next use reconnects
    pub async fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!(error = %e, "Error while closing database connection"),
            }
        }
    }

    /// Render and run a query, returning every row
    pub async fn fetch(&mut self, query: Query) -> DomainResult<Vec<Row>> {
        let statement = query.render()?;
        self.fetch_statement(&statement).await
    }

    /// Run a pre-rendered statement, returning every row
    #[instrument(skip(self, statement), fields(sql = %statement.sql))]
    pub async fn fetch_statement(&mut self, statement: &Statement) -> DomainResult<Vec<Row>> {
        match self.dispatch(statement, Mode::Fetch).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Affected(_) => Ok(Vec::new()),
        }
    }

    /// Render and run a mutation, returning the affected row count
    pub async fn execute(&mut self, query: Query) -> DomainResult<u64> {
        let statement = query.render()?;
        self.execute_statement(&statement).await
    }

    /// Run a pre-rendered mutation or DDL statement
    #[instrument(skip(self, statement), fields(sql = %statement.sql))]
    pub async fn execute_statement(&mut self, statement: &Statement) -> DomainResult<u64> {
        match self.dispatch(statement, Mode::Execute).await? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    /// First row, or `None` when nothing matched
    pub async fn first_row(&mut self, query: Query) -> DomainResult<Option<Row>> {
        Ok(materialize::first_row(self.fetch(query).await?))
    }

    /// First column of the first row
    pub async fn first_value(&mut self, query: Query) -> DomainResult<Option<Value>> {
        Ok(materialize::first_value(self.fetch(query).await?))
    }

    /// One column across every row
    pub async fn list(&mut self, query: Query, field: &str) -> DomainResult<Vec<Value>> {
        materialize::require_field("list", field)?;
        materialize::list(self.fetch(query).await?, field)
    }

    /// Rows folded into `key_field -> value_field` (key defaults to `id`)
    pub async fn dict(
        &mut self,
        query: Query,
        key_field: Option<&str>,
        value_field: &str,
    ) -> DomainResult<HashMap<Value, Value>> {
        materialize::require_field("dict", value_field)?;
        materialize::dict(self.fetch(query).await?, key_field, value_field)
    }

    async fn dispatch(&mut self, statement: &Statement, mode: Mode) -> DomainResult<Outcome> {
        debug!(params = statement.params.len(), ?mode, "Executing statement");

        let first = attempt(self.cursor().await?, statement, mode).await;
        match first {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_connection_lost() => {
                warn!(error = %err, "Connection lost; reconnecting and retrying once");
                self.drop_connection();
                self.connect().await?;
                attempt(self.cursor().await?, statement, mode)
                    .await
                    .map_err(DomainError::from)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Forget a connection known to be dead without talking to it
    fn drop_connection(&mut self) {
        self.conn = None;
    }
}

async fn attempt<K: Connection>(
    conn: &mut K,
    statement: &Statement,
    mode: Mode,
) -> Result<Outcome, DriverError> {
    match mode {
        Mode::Fetch => conn.fetch_all(statement).await.map(Outcome::Rows),
        Mode::Execute => conn.execute(statement).await.map(Outcome::Affected),
    }
}
