//! Minimal text output formatting

use breach_importer::ImportSummary;

/// Delivered and failed record counts
pub fn format_summary(summary: &ImportSummary) -> String {
    format!("{} {}", summary.records_delivered, summary.records_failed)
}
