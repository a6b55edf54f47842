//! Pipeline value types: records, batches and rendered statements

use std::fmt;

use crate::errors::CoreError;
use crate::escape::escape;

/// One validated credential pair.
///
/// Both fields hold escaped text, ready to sit between single quotes in a
/// SQL literal. The only way to build a record is from raw text, so every
/// field is escaped exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    identifier: String,
    secret: String,
}

impl Record {
    /// Escape raw identifier and secret text into a record
    pub fn from_raw(identifier: &str, secret: &str) -> Self {
        Self {
            identifier: escape(identifier),
            secret: escape(secret),
        }
    }

    /// Escaped identifier (the `user` column)
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Escaped secret (the `pass` column)
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// A non-empty, bounded group of records rendered as one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Wrap records into a batch. Empty input is rejected so that no
    /// statement with an empty VALUES list can ever be rendered.
    pub fn new(records: Vec<Record>) -> Result<Self, CoreError> {
        if records.is_empty() {
            return Err(CoreError::EmptyBatch);
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// A rendered multi-row INSERT covering one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    rows: usize,
}

impl Statement {
    pub(crate) fn new(sql: String, rows: usize) -> Self {
        Self { sql, rows }
    }

    /// SQL text, terminated by `;`
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Number of value groups in the statement
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
