//! JSON output formatting

use breach_importer::ImportSummary;

/// Output the run summary as a JSON object
pub fn format_summary(summary: &ImportSummary, sink: &str) -> serde_json::Value {
    serde_json::json!({
        "sink": sink,
        "files": summary.corpus.files,
        "lines": summary.corpus.lines.lines,
        "records_read": summary.corpus.lines.records,
        "malformed_lines": summary.corpus.lines.malformed,
        "invalid_identifiers": summary.corpus.lines.invalid_identifier,
        "resumed_from": summary.resumed_from,
        "batches_delivered": summary.batches_delivered,
        "batches_failed": summary.batches_failed,
        "records_delivered": summary.records_delivered,
        "records_failed": summary.records_failed,
        "elapsed_ms": summary.elapsed_ms,
        "status": if summary.batches_failed > 0 { "partial" } else { "complete" }
    })
}
