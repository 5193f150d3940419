//! Raw audit export to wide table transformation
//!
//! A raw export starts with a fixed number of descriptive lines, followed by
//! a regular CSV table with one row per audit record. Each record's change
//! log is split into entries, normalized, and folded into the wide table
//! under its (timestamp, user, operation) key. The column set is only known
//! once the whole file has been read, so the table is fully buffered.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use super::changelog::parse_change_log;
use super::normalize::ValueNormalizer;
use crate::error::{ExportError, ExportResult};
use crate::models::{AuditKey, Event, WideTable};

pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const USER_COLUMN: &str = "User";
pub const OPERATION_COLUMN: &str = "Operation";
pub const CHANGE_LOG_COLUMN: &str = "Change Log";

/// Positions of the columns the transformer reads
#[derive(Debug, Clone, Copy)]
struct RawColumns {
    timestamp: usize,
    user: usize,
    operation: usize,
    change_log: usize,
}

impl RawColumns {
    fn from_headers(headers: &StringRecord) -> ExportResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    ExportError::Validation(format!(
                        "Raw audit export is missing the '{}' column",
                        name
                    ))
                })
        };

        Ok(Self {
            timestamp: find(TIMESTAMP_COLUMN)?,
            user: find(USER_COLUMN)?,
            operation: find(OPERATION_COLUMN)?,
            change_log: find(CHANGE_LOG_COLUMN)?,
        })
    }
}

/// Pivots raw audit exports into wide tables
pub struct AuditTransformer<'a> {
    normalizer: &'a ValueNormalizer,
    preamble_lines: usize,
}

impl<'a> AuditTransformer<'a> {
    pub fn new(normalizer: &'a ValueNormalizer, preamble_lines: usize) -> Self {
        Self {
            normalizer,
            preamble_lines,
        }
    }

    /// Transform a raw export file
    pub fn transform_file(&self, path: &Path, event: &Event) -> ExportResult<WideTable> {
        let file = File::open(path).map_err(|e| {
            ExportError::Io(format!(
                "Failed to open raw audit file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.transform(BufReader::new(file), event)
    }

    /// Transform a raw export read from `reader`
    pub fn transform<R: BufRead>(&self, mut reader: R, event: &Event) -> ExportResult<WideTable> {
        skip_lines(&mut reader, self.preamble_lines)?;

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = RawColumns::from_headers(csv_reader.headers()?)?;
        let mut table = WideTable::new(event.id, event.label.clone());
        let mut skipped = 0usize;

        for (idx, result) in csv_reader.records().enumerate() {
            let record = result?;

            let change_log = record.get(columns.change_log).unwrap_or("").trim();
            if change_log.is_empty() {
                skipped += 1;
                continue;
            }

            let key = AuditKey::new(
                cell(&record, columns.timestamp),
                cell(&record, columns.user),
                cell(&record, columns.operation),
            );

            table.ensure_row(&key);

            let entries = parse_change_log(change_log);
            if entries.is_empty() {
                warn!(event_id = event.id, row = idx + 1, "change log has no field=value entries");
            }

            for entry in entries {
                if let Some(value) = self.normalizer.normalize(&entry.field, &entry.value) {
                    table.record(&key, &entry.field, value);
                }
            }
        }

        debug!(
            event_id = event.id,
            rows = table.rows().len(),
            columns = table.fields().len(),
            skipped,
            "transformed raw audit export"
        );

        Ok(table)
    }
}

fn cell(record: &StringRecord, idx: usize) -> String {
    record.get(idx).unwrap_or("").trim().to_string()
}

/// Discard the descriptive preamble preceding the CSV header
fn skip_lines<R: BufRead>(reader: &mut R, count: usize) -> ExportResult<()> {
    let mut line = String::new();
    for n in 0..count {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Err(ExportError::Validation(format!(
                "Raw audit export ended after {} of {} preamble lines",
                n, count
            )));
        }
    }
    Ok(())
}
