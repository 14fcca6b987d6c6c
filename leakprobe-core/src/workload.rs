use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::sql::{Ident, Statement, Value};

/// Text bound into the row scenario's insert/delete pair.
pub const ROW_PAYLOAD: &str = "test string";

/// What a single iteration grows and shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    /// `create table` / `drop table`.
    Table,
    /// `create domain` / `drop domain`, a fresh name per iteration.
    Domain,
    /// Parameterized `insert` / `delete` of one row.
    Row,
    /// Whole database file: create, attach, create a table, detach, delete.
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioDefaults {
    pub iterations: u64,
    pub batch_size: u64,
    pub database: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StatementKind {
    Grow,
    Shrink,
    Commit,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [Self::Grow, Self::Shrink, Self::Commit];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Grow => 0,
            Self::Shrink => 1,
            Self::Commit => 2,
        }
    }
}

impl Scenario {
    #[must_use]
    pub fn defaults(self) -> ScenarioDefaults {
        match self {
            Self::Table => ScenarioDefaults {
                iterations: 10_000,
                batch_size: 1000,
                database: "/tmp/test_mem.fdb",
            },
            Self::Domain => ScenarioDefaults {
                iterations: 1000,
                batch_size: 10_000,
                database: "/tmp/test_domain_leak.fdb",
            },
            Self::Row => ScenarioDefaults {
                iterations: 1000,
                batch_size: 1000,
                database: "/tmp/test_mem_data.fdb",
            },
            Self::Database => ScenarioDefaults {
                iterations: 100,
                batch_size: 10,
                database: "/tmp/test_mem.fdb",
            },
        }
    }

    /// Whether every iteration creates and deletes its own database file.
    #[must_use]
    pub fn recreates_database(self) -> bool {
        matches!(self, Self::Database)
    }

    #[must_use]
    pub fn label(self, kind: StatementKind) -> &'static str {
        match (self, kind) {
            (_, StatementKind::Commit) => "COMMIT",
            (Self::Table, StatementKind::Grow) => "CREATE TABLE",
            (Self::Table, StatementKind::Shrink) => "DROP TABLE",
            (Self::Domain, StatementKind::Grow) => "CREATE DOMAIN",
            (Self::Domain, StatementKind::Shrink) => "DROP DOMAIN",
            (Self::Row, StatementKind::Grow) => "INSERT",
            (Self::Row, StatementKind::Shrink) => "DELETE",
            (Self::Database, StatementKind::Grow) => "CREATE DATABASE",
            (Self::Database, StatementKind::Shrink) => "DROP DATABASE",
        }
    }

    /// Executed once, on the run's connection, before the first batch.
    pub fn setup(self) -> Result<Option<Statement>> {
        match self {
            Self::Table | Self::Row => Ok(Some(Statement::create_table(
                &Ident::new("mem")?,
                "str varchar(20)",
            ))),
            Self::Domain | Self::Database => Ok(None),
        }
    }

    /// Executed once after the last batch, unless the run was interrupted.
    pub fn teardown(self) -> Result<Option<Statement>> {
        match self {
            Self::Table | Self::Row => Ok(Some(Statement::drop_table(&Ident::new("mem")?))),
            Self::Domain | Self::Database => Ok(None),
        }
    }

    /// The grow statement of iteration `j` within a batch. For
    /// [`Scenario::Database`] this is the statement run inside each fresh database.
    pub fn grow(self, j: u64) -> Result<Statement> {
        match self {
            Self::Table | Self::Database => {
                Ok(Statement::create_table(&Ident::new("test")?, "id int"))
            }
            Self::Domain => Ok(Statement::create_domain(
                &Ident::numbered("dmn_", j)?,
                "varchar(100)",
            )),
            Self::Row => Ok(Statement::new("insert into mem(str) values(?)")
                .bind(Value::Text(ROW_PAYLOAD.to_string()))),
        }
    }

    /// The shrink statement of iteration `j`. `None` when shrinking means
    /// deleting the database file.
    pub fn shrink(self, j: u64) -> Result<Option<Statement>> {
        match self {
            Self::Table => Ok(Some(Statement::drop_table(&Ident::new("test")?))),
            Self::Domain => Ok(Some(Statement::drop_domain(&Ident::numbered("dmn_", j)?))),
            Self::Row => Ok(Some(
                Statement::new("delete from mem where str = ?")
                    .bind(Value::Text(ROW_PAYLOAD.to_string())),
            )),
            Self::Database => Ok(None),
        }
    }
}

/// Commit granularity. Leak visibility depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum CommitMode {
    #[default]
    EachStatement,
    EachPair,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub scenario: Scenario,
    pub database: PathBuf,
    /// Number of batches; one sample per batch.
    pub iterations: u64,
    /// Grow/shrink pairs per batch.
    pub batch_size: u64,
    pub commit: CommitMode,
    /// Time and sample every statement to attribute cost per statement kind.
    pub trace_statements: bool,
    /// Attach to an existing database instead of recreating it.
    pub reuse_database: bool,
    /// Delete the scratch database after the run.
    pub cleanup: bool,
}

impl WorkloadSpec {
    #[must_use]
    pub fn new(scenario: Scenario) -> Self {
        let defaults = scenario.defaults();
        Self {
            scenario,
            database: PathBuf::from(defaults.database),
            iterations: defaults.iterations,
            batch_size: defaults.batch_size,
            commit: CommitMode::default(),
            trace_statements: false,
            reuse_database: false,
            cleanup: scenario.recreates_database(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        Ok(())
    }

    #[must_use]
    pub fn total_pairs(&self) -> u64 {
        self.iterations.saturating_mul(self.batch_size)
    }
}
