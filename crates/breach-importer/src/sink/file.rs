//! SQL file sink for offline replay (`mysql db < statements.sql`)

use breach_core::Statement;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

use super::{ExecutionSink, Progress};
use crate::error::SinkError;

/// Writes one statement per line
pub struct StatementFileSink<W: Write> {
    writer: W,
    label: String,
}

impl StatementFileSink<BufWriter<File>> {
    /// Create (or truncate) `path`
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), path.display().to_string()))
    }
}

impl StatementFileSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "stdout")
    }
}

impl<W: Write> StatementFileSink<W> {
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer,
            label: label.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExecutionSink for StatementFileSink<W> {
    fn describe(&self) -> String {
        format!("file {}", self.label)
    }

    fn deliver(&mut self, statement: &Statement, _progress: &Progress) -> Result<(), SinkError> {
        self.writer.write_all(statement.as_str().as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}
