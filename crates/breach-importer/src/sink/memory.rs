//! In-memory sink

use breach_core::Statement;

use super::{ExecutionSink, Progress};
use crate::error::SinkError;

/// Keeps every delivered statement, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySink {
    pub statements: Vec<Statement>,
    pub progress: Vec<Progress>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered SQL of every statement, in delivery order
    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(Statement::as_str).collect()
    }
}

impl ExecutionSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn deliver(&mut self, statement: &Statement, progress: &Progress) -> Result<(), SinkError> {
        self.statements.push(statement.clone());
        self.progress.push(*progress);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
