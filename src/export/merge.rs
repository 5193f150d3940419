//! Merging of per-event wide CSVs
//!
//! Each event's wide CSV has its own column set. The merged file uses the
//! union of all headers in first-seen order and leaves cells empty where a
//! file did not have the column.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Writer};

use super::csv::write_to_file;
use crate::config::paths::WIDE_FILE_SUFFIX;
use crate::error::{ExportError, ExportResult};

/// Result of a merge that produced a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub files: usize,
    pub rows: usize,
    pub columns: usize,
}

/// Wide CSVs in `dir`, sorted by file name; empty when `dir` does not exist
pub fn list_wide_files(dir: &Path) -> ExportResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        ExportError::Io(format!("Failed to read directory {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_wide = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(WIDE_FILE_SUFFIX));
        if is_wide && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Concatenate CSV files into `output` over the union of their headers
///
/// Returns `None` without touching `output` when `inputs` is empty.
pub fn merge_csv_files(inputs: &[PathBuf], output: &Path) -> ExportResult<Option<MergeSummary>> {
    if inputs.is_empty() {
        return Ok(None);
    }

    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut tables: Vec<(StringRecord, Vec<StringRecord>)> = Vec::with_capacity(inputs.len());

    for path in inputs {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| ExportError::Csv(format!("Failed to read {}: {}", path.display(), e)))?;

        let headers = reader.headers()?.clone();
        for name in headers.iter() {
            if !positions.contains_key(name) {
                positions.insert(name.to_string(), columns.len());
                columns.push(name.to_string());
            }
        }

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        tables.push((headers, records));
    }

    let mut rows = 0usize;
    write_to_file(output, |file| {
        let mut writer = Writer::from_writer(file);
        writer.write_record(&columns)?;

        for (headers, records) in &tables {
            let targets: Vec<usize> = headers.iter().map(|h| positions[h]).collect();
            for record in records {
                let mut row = vec![""; columns.len()];
                for (value, &target) in record.iter().zip(&targets) {
                    row[target] = value;
                }
                writer.write_record(&row)?;
                rows += 1;
            }
        }

        writer
            .flush()
            .map_err(|e| ExportError::Io(format!("Failed to flush merged CSV: {}", e)))
    })?;

    Ok(Some(MergeSummary {
        files: inputs.len(),
        rows,
        columns: columns.len(),
    }))
}

/// Merge every wide CSV in `dir` into `output`
pub fn merge_wide_csvs(dir: &Path, output: &Path) -> ExportResult<Option<MergeSummary>> {
    let files = list_wide_files(dir)?;
    merge_csv_files(&files, output)
}
