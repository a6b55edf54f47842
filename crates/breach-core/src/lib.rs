//! breach-core - Record parsing and statement rendering for breach imports
//!
//! This crate holds the pull-based pieces of the import pipeline: the per-file
//! record parser, the escaper, the batcher and the statement builder. Nothing
//! here knows about directories or databases; see `breach-importer` for that.

pub mod address;
pub mod batch;
pub mod config;
pub mod errors;
pub mod escape;
pub mod parser;
pub mod statement;
pub mod types;

pub use address::is_valid_address;
pub use batch::{Batcher, IntoBatches, DEFAULT_BATCH_SIZE};
pub use config::{FailurePolicy, ImportConfig};
pub use errors::CoreError;
pub use escape::escape;
pub use parser::{
    parse_line, split_line, Delimiters, FileRecords, LineOutcome, LineRecords, ParseOptions,
    ParseStats,
};
pub use statement::StatementBuilder;
pub use types::{Batch, Record, Statement};
