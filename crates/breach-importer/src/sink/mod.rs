//! Execution sinks: where rendered statements go
//!
//! The pipeline only depends on the [`ExecutionSink`] trait. Adapters cover
//! the mysql command-line client, plain SQL files for offline replay, and an
//! in-memory collector.

mod file;
mod memory;
mod mysql;

pub use file::StatementFileSink;
pub use memory::MemorySink;
pub use mysql::MysqlClientSink;

use breach_core::Statement;
use secrecy::SecretString;

use crate::error::SinkError;

/// Position of one batch in the record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Zero-based batch number within this run
    pub batch_index: u64,
    /// Records of the corpus stream before this batch (resumed records included)
    pub stream_offset: u64,
    /// Records in this batch
    pub batch_records: usize,
}

impl Progress {
    /// Stream position right after this batch
    pub fn end_offset(&self) -> u64 {
        self.stream_offset + self.batch_records as u64
    }
}

/// Receives statements one at a time, in stream order.
///
/// A returned error means the statement was not (known to be) applied.
pub trait ExecutionSink {
    /// Short human-readable description for logs and summaries
    fn describe(&self) -> String;

    fn deliver(&mut self, statement: &Statement, progress: &Progress) -> Result<(), SinkError>;

    /// Flush buffered output after the last statement
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Database and credentials a statement is delivered to
#[derive(Debug)]
pub struct Target {
    pub database: String,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Target {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            user: None,
            password: None,
            host: None,
            port: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}
