//! The database seam.
//!
//! The probe only ever creates a database, opens a connection, executes a
//! statement, commits and closes. Backends implement [`Connector`] and
//! [`Connection`]; everything else in this crate is backend-agnostic.

use std::path::Path;

use crate::sql::Statement;

/// Error raised by a database backend. Only the server's message is kept:
/// the expectation runner matches on its text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DbError {
    message: String,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Connection parameters shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            user: "sysdba".to_string(),
            password: "masterkey".to_string(),
        }
    }
}

pub trait Connector {
    /// Create a new database file at `path` and attach to it.
    fn create_database(&self, path: &Path) -> Result<Box<dyn Connection>, DbError>;

    /// Attach to an existing database file at `path`.
    fn connect(&self, path: &Path) -> Result<Box<dyn Connection>, DbError>;
}

pub trait Connection {
    fn execute(&mut self, stmt: &Statement) -> Result<(), DbError>;

    fn commit(&mut self) -> Result<(), DbError>;

    /// Detach. Dropping a connection without calling this must still release it.
    fn close(self: Box<Self>) -> Result<(), DbError>;
}
