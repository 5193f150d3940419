//! CSV Export functionality
//!
//! Writes the simple events listing and per-event wide audit tables.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ::csv::Writer;

use crate::error::{ExportError, ExportResult};
use crate::models::{Event, WideTable, EVENT_COLUMNS};

/// Export events to CSV, one row per event
pub fn export_events_csv<W: Write>(events: &[Event], writer: W) -> ExportResult<()> {
    let mut csv_writer = Writer::from_writer(writer);

    csv_writer.write_record(EVENT_COLUMNS)?;
    for event in events {
        csv_writer.write_record(event.to_record())?;
    }

    csv_writer
        .flush()
        .map_err(|e| ExportError::Io(format!("Failed to flush events CSV: {}", e)))?;
    Ok(())
}

/// Export a wide audit table to CSV
pub fn export_wide_csv<W: Write>(table: &WideTable, writer: W) -> ExportResult<()> {
    let mut csv_writer = Writer::from_writer(writer);

    csv_writer.write_record(table.header())?;
    for record in table.records() {
        csv_writer.write_record(&record)?;
    }

    csv_writer
        .flush()
        .map_err(|e| ExportError::Io(format!("Failed to flush wide CSV: {}", e)))?;
    Ok(())
}

/// Create `path` and hand a buffered writer to `write`
pub fn write_to_file<F>(path: &Path, write: F) -> ExportResult<()>
where
    F: FnOnce(BufWriter<File>) -> ExportResult<()>,
{
    let file = File::create(path).map_err(|e| {
        ExportError::Io(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    write(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditKey;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_export_events_csv() {
        let mut event = Event::new(12, "Baseline, Day 0");
        event.collection_protocol = Some(json!("CP-A"));
        event.clinical_status = Some(json!("Active"));

        let mut csv_output = Vec::new();
        export_events_csv(&[event, Event::new(13, "Follow-up")], &mut csv_output).unwrap();

        let csv_string = String::from_utf8(csv_output).unwrap();
        let lines: Vec<_> = csv_string.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Event Label,Collection Protocol,defaultSite,clinicalDiagnosis,clinicalStatus,activityStatus,code"
        );
        assert_eq!(lines[1], "12,\"Baseline, Day 0\",CP-A,,,Active,,");
        assert_eq!(lines[2], "13,Follow-up,,,,,,");
    }

    #[test]
    fn test_export_wide_csv() {
        let mut table = WideTable::new(12, "Baseline");
        table.record(&AuditKey::new("T1", "U1", "UPDATE"), "note", "ok".into());
        table.record(
            &AuditKey::new("T1", "U1", "UPDATE"),
            "site",
            "{id=3, name=Lab}".into(),
        );

        let mut csv_output = Vec::new();
        export_wide_csv(&table, &mut csv_output).unwrap();

        let csv_string = String::from_utf8(csv_output).unwrap();
        assert_eq!(
            csv_string,
            "Modified Date,Modified By,Operation,Event ID,Event Label,note,site\n\
             T1,U1,UPDATE,12,Baseline,ok,\"{id=3, name=Lab}\"\n"
        );
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("events.csv");

        write_to_file(&path, |w| export_events_csv(&[Event::new(1, "A")], w)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("ID,Event Label"));
        assert!(contents.contains("1,A,"));
    }
}
