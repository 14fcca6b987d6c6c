use std::fmt;

use crate::error::{Error, Result};

/// Firebird 4 limit for object names.
const MAX_IDENT_LEN: usize = 63;

/// A validated, unquoted SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let mut chars = raw.chars();
        let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

        if !valid_head || !valid_tail || raw.len() > MAX_IDENT_LEN {
            return Err(Error::InvalidIdentifier(raw));
        }
        Ok(Self(raw))
    }

    /// `prefix` followed by a decimal suffix, e.g. `dmn_42`.
    pub fn numbered(prefix: &str, n: u64) -> Result<Self> {
        Self::new(format!("{prefix}{n}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, value: Value) -> Self {
        self.params.push(value);
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn create_table(table: &Ident, columns: &str) -> Self {
        Self::new(format!("create table {table}({columns})"))
    }

    pub fn drop_table(table: &Ident) -> Self {
        Self::new(format!("drop table {table}"))
    }

    pub fn create_domain(domain: &Ident, ty: &str) -> Self {
        Self::new(format!("create domain {domain} as {ty}"))
    }

    pub fn drop_domain(domain: &Ident) -> Self {
        Self::new(format!("drop domain {domain}"))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
