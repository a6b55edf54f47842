//! Importer and sink error types

use breach_core::CoreError;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that abort an import run
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Corpus root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Corpus root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot walk corpus: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Delivery of batch {batch} failed: {source}")]
    Delivery {
        batch: u64,
        #[source]
        source: SinkError,
    },

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Journal error: {0}")]
    Journal(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while delivering one statement
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with {status}: {stderr}", .program.display())]
    ClientFailed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Whether another attempt could succeed. A client that cannot be
    /// started will not start on the next attempt either.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SinkError::Spawn { .. })
    }
}
