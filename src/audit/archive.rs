//! Audit export archive handling
//!
//! The revisions export is delivered as a zip archive holding the raw audit
//! CSV next to other members. Only the CSV whose file name starts with the
//! configured prefix is used.

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{ExportError, ExportResult};

/// Whether an archive member is the raw audit CSV
fn is_raw_member(name: &str, prefix: &str) -> bool {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    file_name.starts_with(prefix) && file_name.to_ascii_lowercase().ends_with(".csv")
}

/// Find the name of the raw audit member in an archive
pub fn find_raw_member(bytes: &[u8], prefix: &str) -> ExportResult<String> {
    let archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut matches: Vec<String> = archive
        .file_names()
        .filter(|name| is_raw_member(name, prefix))
        .map(str::to_string)
        .collect();
    matches.sort();

    if matches.len() > 1 {
        warn!(
            members = ?matches,
            "export archive holds several raw audit files, using the first"
        );
    }

    matches.into_iter().next().ok_or_else(|| {
        ExportError::Archive(format!(
            "No '{}*.csv' member found in export archive",
            prefix
        ))
    })
}

/// Extract the raw audit member to `dest`, returning the member name
pub fn extract_raw_member(bytes: &[u8], prefix: &str, dest: &Path) -> ExportResult<String> {
    let name = find_raw_member(bytes, prefix)?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut member = archive.by_name(&name)?;

    let file = File::create(dest).map_err(|e| {
        ExportError::Io(format!("Failed to create {}: {}", dest.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    let written = std::io::copy(&mut member, &mut writer)
        .map_err(|e| ExportError::Archive(format!("Failed to extract {}: {}", name, e)))?;
    writer.flush()?;

    debug!(member = %name, bytes = written, dest = %dest.display(), "extracted raw audit file");
    Ok(name)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Build an in-memory zip archive from (name, contents) pairs
    pub(crate) fn zip_bytes(members: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_is_raw_member() {
        assert!(is_raw_member("revisions_123.csv", "revisions"));
        assert!(is_raw_member("out/revisions.CSV", "revisions"));
        assert!(!is_raw_member("revisions_123.txt", "revisions"));
        assert!(!is_raw_member("summary.csv", "revisions"));
        assert!(!is_raw_member("revisions/summary.csv", "revisions"));
    }

    #[test]
    fn test_extract_raw_member() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("raw.csv");
        let bytes = zip_bytes(&[
            ("README.txt", "ignore me"),
            ("revisions_42.csv", "a,b\n1,2\n"),
        ]);

        let name = extract_raw_member(&bytes, "revisions", &dest).unwrap();

        assert_eq!(name, "revisions_42.csv");
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_missing_member_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let bytes = zip_bytes(&[("other.csv", "x")]);

        let err = extract_raw_member(&bytes, "revisions", &temp_dir.path().join("raw.csv"))
            .unwrap_err();
        assert!(matches!(err, ExportError::Archive(_)));
        assert!(!temp_dir.path().join("raw.csv").exists());
    }

    #[test]
    fn test_not_a_zip_is_error() {
        let err = find_raw_member(b"definitely not a zip", "revisions").unwrap_err();
        assert!(matches!(err, ExportError::Archive(_)));
    }
}
