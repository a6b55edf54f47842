//! Human-readable output formatting

use breach_importer::ImportSummary;

use super::colors::*;

/// Format the end-of-run summary
pub fn format_summary(summary: &ImportSummary, sink: &str) -> String {
    let corpus = &summary.corpus;
    let mut lines = vec![header("Import Summary"), String::new()];

    lines.push(format!("  {}: {}", label("Sink"), value(sink)));
    lines.push(format!(
        "  {}: {}",
        label("Files scanned"),
        value(&format_count(corpus.files))
    ));
    lines.push(format!(
        "  {}: {}",
        label("Lines read"),
        value(&format_count(corpus.lines.lines))
    ));
    lines.push(format!(
        "  {}: {} ({} malformed, {} invalid identifier)",
        label("Lines dropped"),
        value(&format_count(corpus.lines.dropped())),
        format_count(corpus.lines.malformed),
        format_count(corpus.lines.invalid_identifier)
    ));
    if summary.resumed_from > 0 {
        lines.push(format!(
            "  {}: {}",
            label("Resumed after"),
            value(&format!("{} records", format_count(summary.resumed_from)))
        ));
    }
    lines.push(format!(
        "  {}: {} in {} batches",
        label("Records delivered"),
        value(&format_count(summary.records_delivered)),
        format_count(summary.batches_delivered)
    ));
    lines.push(format!(
        "  {}: {}",
        label("Elapsed"),
        value(&format_duration(summary.elapsed_ms))
    ));

    lines.push(String::new());
    if summary.batches_failed > 0 {
        lines.push(warning(&format!(
            "{} batches ({} records) were skipped after delivery failures",
            format_count(summary.batches_failed),
            format_count(summary.records_failed)
        )));
    } else {
        lines.push(success("Import complete"));
    }

    lines.join("\n")
}
