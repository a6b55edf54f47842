//! The import pipeline: corpus -> records -> batches -> statements -> sink
//!
//! Every stage is a pull iterator, so memory stays bounded by one batch no
//! matter how large the corpus is.

use breach_core::{FailurePolicy, IntoBatches, ParseOptions, StatementBuilder};
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::delivery::{deliver_with_retry, DeliveryPolicy};
use crate::discovery::{CorpusRecords, CorpusStats, CorpusWalker};
use crate::error::ImportError;
use crate::journal::{ImportJournal, ImportKey, ImportStatus};
use crate::sink::{ExecutionSink, Progress};

/// Everything needed to run one import
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub root: PathBuf,
    /// Target database name; only used to key the journal
    pub database: String,
    pub table: String,
    pub batch_size: NonZeroUsize,
    pub parse: ParseOptions,
    pub policy: DeliveryPolicy,
    /// Continue from the journaled offset instead of starting over
    pub resume: bool,
}

/// Outcome of one batch, as reported to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Delivered,
    Skipped,
}

/// Totals for a finished import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub corpus: CorpusStats,
    pub batches_delivered: u64,
    pub batches_failed: u64,
    pub records_delivered: u64,
    pub records_failed: u64,
    /// Records skipped at the start because an earlier run delivered them
    pub resumed_from: u64,
    pub elapsed_ms: u64,
}

/// Run an import end to end.
///
/// Configuration problems (bad table name, missing root) are reported before
/// anything is read or delivered. Statements already delivered are never
/// rolled back when a later error aborts the run.
pub fn run_import<S, F>(
    request: &ImportRequest,
    sink: &mut S,
    journal: Option<&ImportJournal>,
    mut on_progress: F,
) -> Result<ImportSummary, ImportError>
where
    S: ExecutionSink + ?Sized,
    F: FnMut(&Progress, BatchStatus),
{
    let started = Instant::now();
    let builder = StatementBuilder::new(request.table.as_str())?;
    let walker = CorpusWalker::new(&request.root)?;

    let key = ImportKey::new(walker.root(), request.database.as_str(), request.table.as_str());
    let resume_offset = match journal {
        Some(journal) => journal.start(&key, &request.parse.fingerprint(), request.resume)?,
        None => 0,
    };

    info!(
        root = %walker.root().display(),
        sink = %sink.describe(),
        batch_size = request.batch_size.get(),
        "starting import"
    );

    let mut summary = ImportSummary {
        resumed_from: resume_offset,
        ..Default::default()
    };

    let result = drive(
        request,
        &walker,
        &builder,
        sink,
        journal.map(|j| (j, &key)),
        &mut summary,
        &mut on_progress,
    );

    summary.elapsed_ms = started.elapsed().as_millis() as u64;

    if let Some(journal) = journal {
        let status = if result.is_ok() {
            ImportStatus::Completed
        } else {
            ImportStatus::Failed
        };
        match journal.finish(&key, status) {
            Ok(()) => {}
            Err(e) if result.is_err() => warn!("could not mark journal entry as failed: {}", e),
            Err(e) => return Err(e),
        }
    }

    result?;
    info!(
        records = summary.records_delivered,
        batches = summary.batches_delivered,
        failed = summary.batches_failed,
        "import finished"
    );
    Ok(summary)
}

fn drive<S, F>(
    request: &ImportRequest,
    walker: &CorpusWalker,
    builder: &StatementBuilder,
    sink: &mut S,
    journal: Option<(&ImportJournal, &ImportKey)>,
    summary: &mut ImportSummary,
    on_progress: &mut F,
) -> Result<(), ImportError>
where
    S: ExecutionSink + ?Sized,
    F: FnMut(&Progress, BatchStatus),
{
    let mut records = walker.records(request.parse.clone());
    let mut offset = skip_records(&mut records, summary.resumed_from)?;
    if offset < summary.resumed_from {
        warn!(
            journaled = summary.resumed_from,
            available = offset,
            "corpus is shorter than the journaled offset; nothing left to import"
        );
        summary.resumed_from = offset;
    }

    let mut batches = records.batches(request.batch_size);
    let mut batch_index = 0u64;

    while let Some(batch) = batches.next() {
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                summary.corpus = batches.get_ref().stats();
                return Err(e);
            }
        };

        let statement = builder.build(&batch);
        let progress = Progress {
            batch_index,
            stream_offset: offset,
            batch_records: batch.len(),
        };

        let status = match deliver_with_retry(sink, &statement, &progress, &request.policy) {
            Ok(()) => {
                summary.batches_delivered += 1;
                summary.records_delivered += batch.len() as u64;
                debug!(batch = batch_index, rows = batch.len(), "batch delivered");
                BatchStatus::Delivered
            }
            Err(e) => match request.policy.on_failure {
                FailurePolicy::Abort => {
                    summary.corpus = batches.get_ref().stats();
                    return Err(ImportError::Delivery {
                        batch: batch_index,
                        source: e,
                    });
                }
                FailurePolicy::Skip => {
                    warn!(batch = batch_index, rows = batch.len(), "skipping batch: {}", e);
                    summary.batches_failed += 1;
                    summary.records_failed += batch.len() as u64;
                    BatchStatus::Skipped
                }
            },
        };

        if let Some((journal, key)) = journal {
            journal.record_batch(key, &progress, status == BatchStatus::Delivered)?;
        }
        on_progress(&progress, status);

        offset = progress.end_offset();
        batch_index += 1;
    }

    summary.corpus = batches.get_ref().stats();
    sink.finish()?;
    Ok(())
}

/// Consume up to `n` records; returns how many were actually there
fn skip_records(records: &mut CorpusRecords, n: u64) -> Result<u64, ImportError> {
    let mut skipped = 0;
    while skipped < n {
        match records.next() {
            Some(Ok(_)) => skipped += 1,
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }
    Ok(skipped)
}
