#![forbid(unsafe_code)]

//! Firebird backend for the probe, over the pure-Rust wire client.
//!
//! Statements run inside an explicit transaction that is opened lazily on
//! the first `execute` after a commit, so the driver controls commit
//! granularity.

use std::fmt;
use std::path::Path;

use leakprobe_core::{ConnectOptions, Connection, Connector, DbError, Statement, Value};
use rsfbclient::prelude::*;
use rsfbclient::{FbError, FirebirdClient, SqlType};

pub struct FirebirdConnector {
    opts: ConnectOptions,
}

impl FirebirdConnector {
    #[must_use]
    pub fn new(opts: ConnectOptions) -> Self {
        Self { opts }
    }

    fn attach(&self, path: &Path, create: bool) -> Result<Box<dyn Connection>, DbError> {
        let mut builder = rsfbclient::builder_pure_rust();
        builder
            .host(self.opts.host.as_str())
            .db_name(db_name(path)?)
            .user(self.opts.user.as_str())
            .pass(self.opts.password.as_str());
        if let Some(port) = self.opts.port {
            builder.port(port);
        }

        // The two builder calls return distinct client types.
        if create {
            let conn = builder.create_database().map_err(db_error)?;
            Ok(Box::new(FirebirdConnection::new(conn)))
        } else {
            let conn = builder.connect().map_err(db_error)?;
            Ok(Box::new(FirebirdConnection::new(conn)))
        }
    }
}

fn db_name(path: &Path) -> Result<&str, DbError> {
    path.to_str()
        .ok_or_else(|| DbError::new(format!("non UTF-8 database path: {}", path.display())))
}

impl Connector for FirebirdConnector {
    fn create_database(&self, path: &Path) -> Result<Box<dyn Connection>, DbError> {
        log::debug!("creating database {}:{}", self.opts.host, path.display());
        self.attach(path, true)
    }

    fn connect(&self, path: &Path) -> Result<Box<dyn Connection>, DbError> {
        log::debug!("attaching to {}:{}", self.opts.host, path.display());
        self.attach(path, false)
    }
}

struct FirebirdConnection<C: FirebirdClient> {
    inner: rsfbclient::Connection<C>,
    in_transaction: bool,
}

impl<C: FirebirdClient> FirebirdConnection<C> {
    fn new(inner: rsfbclient::Connection<C>) -> Self {
        Self {
            inner,
            in_transaction: false,
        }
    }
}

impl<C: FirebirdClient> Connection for FirebirdConnection<C> {
    fn execute(&mut self, stmt: &Statement) -> Result<(), DbError> {
        if !self.in_transaction {
            self.inner.begin_transaction().map_err(db_error)?;
            self.in_transaction = true;
        }
        self.inner
            .execute(stmt.sql(), params(stmt))
            .map(|_| ())
            .map_err(db_error)
    }

    fn commit(&mut self) -> Result<(), DbError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        commit_or_rollback(&mut self.inner)
    }

    fn close(self: Box<Self>) -> Result<(), DbError> {
        self.inner.close().map_err(db_error)
    }
}

fn params(stmt: &Statement) -> Vec<SqlType> {
    stmt.params()
        .iter()
        .map(|v| match v {
            Value::Text(s) => SqlType::Text(s.clone()),
        })
        .collect()
}

fn db_error(err: FbError) -> DbError {
    DbError::new(err.to_string())
}

/// The connection-level transaction calls used by [`commit_or_rollback`].
trait Transactional {
    type Error: fmt::Display;

    fn commit_tx(&mut self) -> Result<(), Self::Error>;
    fn rollback_tx(&mut self) -> Result<(), Self::Error>;
}

impl<C: FirebirdClient> Transactional for rsfbclient::Connection<C> {
    type Error = FbError;

    fn commit_tx(&mut self) -> Result<(), FbError> {
        self.commit()
    }

    fn rollback_tx(&mut self) -> Result<(), FbError> {
        self.rollback()
    }
}

/// A failed commit leaves the transaction open on the server until detach,
/// which also makes the detach fail; roll it back before reporting.
fn commit_or_rollback<T: Transactional>(tx: &mut T) -> Result<(), DbError> {
    let Err(err) = tx.commit_tx() else {
        return Ok(());
    };
    if let Err(rb) = tx.rollback_tx() {
        log::warn!("rollback after failed commit failed: {rb}");
    }
    Err(DbError::new(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_order() {
        let stmt = Statement::new("insert into t values(?, ?)")
            .bind(Value::Text("a".to_string()))
            .bind(Value::Text("b".to_string()));
        let got = params(&stmt);
        assert_eq!(got.len(), 2);
        assert!(matches!(&got[0], SqlType::Text(s) if s == "a"));
        assert!(matches!(&got[1], SqlType::Text(s) if s == "b"));
    }

    #[derive(Default)]
    struct ScriptedTx {
        commit_error: Option<&'static str>,
        calls: Vec<&'static str>,
    }

    impl Transactional for ScriptedTx {
        type Error = &'static str;

        fn commit_tx(&mut self) -> Result<(), &'static str> {
            self.calls.push("commit");
            self.commit_error.map_or(Ok(()), Err)
        }

        fn rollback_tx(&mut self) -> Result<(), &'static str> {
            self.calls.push("rollback");
            Ok(())
        }
    }

    #[test]
    fn successful_commit_does_not_roll_back() {
        let mut tx = ScriptedTx::default();
        assert!(commit_or_rollback(&mut tx).is_ok());
        assert_eq!(tx.calls, ["commit"]);
    }

    #[test]
    fn failed_commit_rolls_back_and_reports_commit_error() {
        let mut tx = ScriptedTx {
            commit_error: Some("unsuccessful metadata update"),
            ..ScriptedTx::default()
        };
        let err = match commit_or_rollback(&mut tx) {
            Ok(()) => panic!("commit should fail"),
            Err(err) => err,
        };
        assert_eq!(err.message(), "unsuccessful metadata update");
        assert_eq!(tx.calls, ["commit", "rollback"]);
    }

    #[test]
    fn db_name_passes_plain_paths_through() {
        assert!(matches!(
            db_name(Path::new("/tmp/test_mem.fdb")),
            Ok("/tmp/test_mem.fdb")
        ));
    }

    #[cfg(unix)]
    #[test]
    fn db_name_rejects_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/tmp/\xff.fdb"));
        assert!(db_name(path).is_err());
    }
}
