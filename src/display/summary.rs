//! Audit run summary formatting
//!
//! Formats the per-event outcomes of an audit export for terminal output.

use crate::services::{AuditRunSummary, EventOutcome};

/// Format the outcome of an audit run as a table
pub fn format_audit_summary(summary: &AuditRunSummary) -> String {
    if summary.outcomes.is_empty() {
        return "No events were processed.".to_string();
    }

    let label_width = summary
        .outcomes
        .iter()
        .map(|o| o.event().label.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>8}  {:<label_width$}  {:<8}  {}\n",
        "Event",
        "Label",
        "Status",
        "Details",
        label_width = label_width,
    ));
    output.push_str(&format!(
        "{:->8}  {:-<label_width$}  {:-<8}  {:-<10}\n",
        "",
        "",
        "",
        "",
        label_width = label_width,
    ));

    for outcome in &summary.outcomes {
        let (status, details) = match outcome {
            EventOutcome::Exported { path, rows, .. } => {
                ("OK", format!("{} rows -> {}", rows, path.display()))
            }
            EventOutcome::Failed { error, .. } => ("FAILED", error.clone()),
        };

        output.push_str(&format!(
            "{:>8}  {:<label_width$}  {:<8}  {}\n",
            outcome.event().id,
            outcome.event().label,
            status,
            details,
            label_width = label_width,
        ));
    }

    let failed = summary.failed().count();
    output.push_str(&format!(
        "\n{} exported, {} failed\n",
        summary.exported_count(),
        failed
    ));

    output
}
