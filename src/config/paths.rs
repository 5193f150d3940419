//! Path management for os-event-export
//!
//! Resolves where the settings file lives and where export files are written.
//!
//! ## Path Resolution Order
//!
//! 1. `OS_EVENT_EXPORT_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/os-event-export` or `~/.config/os-event-export`
//! 3. Windows: `%APPDATA%\os-event-export`

use std::path::{Path, PathBuf};

use crate::error::ExportError;

/// Manages all paths used by the exporter
#[derive(Debug, Clone)]
pub struct ExporterPaths {
    /// Base directory holding the settings file
    base_dir: PathBuf,
}

impl ExporterPaths {
    /// Create a new ExporterPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ExportError> {
        let base_dir = if let Ok(custom) = std::env::var("OS_EVENT_EXPORT_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create ExporterPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/os-event-export/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ExportError::Io(format!("Failed to create base directory: {}", e)))
    }

    /// Check if the exporter has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Output file layout for one collection protocol
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_dir: PathBuf,
    cp_id: String,
}

impl OutputLayout {
    /// Create a layout rooted at `output_dir` for the given protocol id
    pub fn new(output_dir: impl Into<PathBuf>, cp_id: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            cp_id: cp_id.into(),
        }
    }

    /// Directory the layout is rooted at
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `cp_<id>_events.csv`
    pub fn events_file(&self) -> PathBuf {
        self.output_dir.join(format!("cp_{}_events.csv", self.cp_id))
    }

    /// `event_audits_cp_<id>/`
    pub fn audit_dir(&self) -> PathBuf {
        self.output_dir.join(format!("event_audits_cp_{}", self.cp_id))
    }

    /// Intermediate raw export for one event, removed after transforming
    pub fn raw_audit_file(&self, event_id: i64) -> PathBuf {
        self.audit_dir().join(format!("event_{}_raw.csv", event_id))
    }

    /// `event_audits_cp_<id>/event_<id>_<label>_wide.csv`
    pub fn wide_audit_file(&self, event_id: i64, label: &str) -> PathBuf {
        self.audit_dir().join(format!(
            "event_{}_{}{}",
            event_id,
            sanitize_file_component(label),
            WIDE_FILE_SUFFIX
        ))
    }

    /// `cp_<id>_merged_event_audit.csv`
    pub fn merged_audit_file(&self) -> PathBuf {
        self.output_dir
            .join(format!("cp_{}_merged_event_audit.csv", self.cp_id))
    }
}

/// Suffix shared by every per-event wide CSV
pub const WIDE_FILE_SUFFIX: &str = "_wide.csv";

/// Replace characters that are unsafe in file names with `_`
pub fn sanitize_file_component(s: &str) -> String {
    let cleaned: String = s
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unlabelled".to_string()
    } else {
        cleaned
    }
}

/// Resolve the default config directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, ExportError> {
    // Unix (Linux/macOS): Use XDG_CONFIG_HOME if set, otherwise ~/.config
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("os-event-export"));
    }
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| ExportError::Config("Could not determine home directory".into()))?;
    Ok(dirs.home_dir().join(".config").join("os-event-export"))
}

/// Resolve the default config directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, ExportError> {
    let dirs = directories::BaseDirs::new()
        .ok_or_else(|| ExportError::Config("Could not determine APPDATA directory".into()))?;
    Ok(dirs.config_dir().join("os-event-export"))
}
