use std::path::PathBuf;

use crate::db::DbError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ProcessNotFound,
    WorkerNotFound,
    ProcessGone,
    Database,
    Statement,
    InvalidIdentifier,
    InvalidWorkload,
    Scratch,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("server process `{name}` not found")]
    ProcessNotFound { name: String },

    #[error("attachment process for `{name}` not found (main pid {main_pid}); is a connection open?")]
    WorkerNotFound { name: String, main_pid: u32 },

    #[error("tracked process {pid} is gone (server restarted?)")]
    ProcessGone { pid: u32 },

    #[error("{context}")]
    Database {
        context: &'static str,
        #[source]
        source: DbError,
    },

    #[error("statement failed: `{sql}`")]
    Statement {
        sql: String,
        #[source]
        source: DbError,
    },

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("`batch_size` must be a positive integer")]
    InvalidBatchSize,

    #[error("failed to remove scratch database {}: {source}", path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProcessNotFound { .. } => ErrorKind::ProcessNotFound,
            Self::WorkerNotFound { .. } => ErrorKind::WorkerNotFound,
            Self::ProcessGone { .. } => ErrorKind::ProcessGone,
            Self::Database { .. } => ErrorKind::Database,
            Self::Statement { .. } => ErrorKind::Statement,
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::InvalidBatchSize => ErrorKind::InvalidWorkload,
            Self::Scratch { .. } => ErrorKind::Scratch,
        }
    }

    pub(crate) fn database(context: &'static str) -> impl FnOnce(DbError) -> Self {
        move |source| Self::Database { context, source }
    }
}
