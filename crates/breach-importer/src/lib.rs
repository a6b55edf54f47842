//! breach-importer - Corpus walking and statement delivery
//!
//! This crate drives the import: it walks the corpus, feeds every file through
//! the `breach-core` parser, batches the record stream and hands each rendered
//! statement to an [`ExecutionSink`]. Progress can be journaled to a local
//! SQLite file so an interrupted run can pick up where it stopped.

pub mod delivery;
pub mod discovery;
pub mod error;
pub mod journal;
pub mod pipeline;
pub mod sink;

pub use delivery::{deliver_with_retry, DeliveryPolicy};
pub use discovery::{CorpusRecords, CorpusStats, CorpusWalker};
pub use error::{ImportError, SinkError};
pub use journal::{default_journal_path, ImportJournal, ImportKey, ImportStatus, JournalEntry};
pub use pipeline::{run_import, BatchStatus, ImportRequest, ImportSummary};
pub use sink::{
    ExecutionSink, MemorySink, MysqlClientSink, Progress, StatementFileSink, Target,
};
