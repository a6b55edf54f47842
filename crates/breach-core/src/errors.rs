//! Error types for the core crate

use std::path::PathBuf;
use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Read failed in {} at line {line}: {source}", .path.display())]
    Read {
        path: PathBuf,
        line: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid UTF-8 in {} at line {line}", .path.display())]
    Encoding { path: PathBuf, line: u64 },

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Delimiter set must contain at least one character")]
    NoDelimiters,

    #[error("Batch must contain at least one record")]
    EmptyBatch,
}
