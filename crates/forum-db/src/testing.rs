//! In-memory scripted driver for unit tests
//!
//! Replies are consumed in order, one per statement; when the script runs dry
//! every statement returns no rows. All clones share one script, so a test keeps
//! a handle to inspect recorded statements after handing a clone to a session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::query::{Statement, Value};
use crate::row::Row;
use crate::session::{Connection, Connector, DriverError};

enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(DriverError),
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    statements: Vec<Statement>,
    connect_attempts: usize,
    connects: usize,
    closes: usize,
    failing_connects: usize,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub(crate) fn push_rows(&self, rows: Vec<Row>) {
        self.script().replies.push_back(Reply::Rows(rows));
    }

    pub(crate) fn push_affected(&self, n: u64) {
        self.script().replies.push_back(Reply::Affected(n));
    }

    pub(crate) fn push_error(&self, err: DriverError) {
        self.script().replies.push_back(Reply::Fail(err));
    }

    pub(crate) fn fail_next_connects(&self, n: usize) {
        self.script().failing_connects = n;
    }

    pub(crate) fn statements(&self) -> Vec<Statement> {
        self.script().statements.clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.script().connects
    }

    pub(crate) fn connect_attempts(&self) -> usize {
        self.script().connect_attempts
    }

    pub(crate) fn closes(&self) -> usize {
        self.script().closes
    }
}

pub(crate) struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    fn next_reply(&self, statement: &Statement) -> Reply {
        let mut script = self.script.lock().unwrap();
        script.statements.push(statement.clone());
        script
            .replies
            .pop_front()
            .unwrap_or(Reply::Rows(Vec::new()))
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<Row>, DriverError> {
        match self.next_reply(statement) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
            Reply::Fail(err) => Err(err),
        }
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, DriverError> {
        match self.next_reply(statement) {
            Reply::Rows(rows) => Ok(rows.len() as u64),
            Reply::Affected(n) => Ok(n),
            Reply::Fail(err) => Err(err),
        }
    }

    async fn close(self) -> Result<(), DriverError> {
        self.script.lock().unwrap().closes += 1;
        Ok(())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self) -> Result<ScriptedConnection, DriverError> {
        let mut script = self.script();
        script.connect_attempts += 1;
        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(DriverError::Connect("access denied".into()));
        }
        script.connects += 1;
        Ok(ScriptedConnection {
            script: Arc::clone(&self.script),
        })
    }
}

/// Build a row from literal pairs
pub(crate) fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, v.clone())))
}

/// Shorthand for a text value
pub(crate) fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}
