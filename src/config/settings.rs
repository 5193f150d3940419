//! User settings for os-event-export
//!
//! Holds the API endpoint and credentials, the polling budget for audit
//! exports and the association between change-log fields and the
//! permissible-value attributes used to resolve them.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::ExporterPaths;
use crate::error::ExportError;

/// What a reference field resolves to when its id has no mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedFallback {
    /// Keep the raw change-log value
    Raw,
    /// Replace with the literal "Not Specified"
    NotSpecified,
}

/// A change-log field whose values are permissible-value references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceField {
    /// Field name as it appears in the change log (e.g. `clinicalStatus`)
    pub field: String,
    /// Permissible-value attribute to resolve ids against (e.g. `clinical_status`)
    pub attribute: String,
    /// Behaviour when the id is absent or unmapped
    pub fallback: UnmappedFallback,
}

impl ReferenceField {
    pub fn new(field: &str, attribute: &str, fallback: UnmappedFallback) -> Self {
        Self {
            field: field.to_string(),
            attribute: attribute.to_string(),
            fallback,
        }
    }
}

/// User settings for os-event-export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// OpenSpecimen server root, without the `/rest/ng` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Login name used to open a session
    #[serde(default)]
    pub login_name: String,

    /// Password; prompted for when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Authentication domain
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    /// Seconds between polls for an export file
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum seconds to wait for one export file
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Length of the trailing audit window in days
    #[serde(default = "default_audit_window_days")]
    pub audit_window_days: i64,

    /// Descriptive lines preceding the header in a raw audit export
    #[serde(default = "default_preamble_lines")]
    pub preamble_lines: usize,

    /// File name prefix of the audit CSV inside the export archive
    #[serde(default = "default_raw_member_prefix")]
    pub raw_member_prefix: String,

    /// Entity type named in export-revisions requests
    #[serde(default = "default_audit_entity")]
    pub audit_entity: String,

    /// Page size requested when listing permissible values
    #[serde(default = "default_permissible_value_limit")]
    pub permissible_value_limit: u32,

    /// Change-log fields resolved through permissible values
    #[serde(default = "default_reference_fields")]
    pub reference_fields: Vec<ReferenceField>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_base_url() -> String {
    "https://demo.openspecimen.org".to_string()
}

fn default_domain_name() -> String {
    "openspecimen".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_wait_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Upper bound on the audit window, one hundred years
pub const MAX_AUDIT_WINDOW_DAYS: i64 = 36_500;

fn default_audit_window_days() -> i64 {
    365
}

fn default_preamble_lines() -> usize {
    6
}

fn default_raw_member_prefix() -> String {
    "revisions".to_string()
}

fn default_audit_entity() -> String {
    "CollectionProtocolEvent".to_string()
}

fn default_permissible_value_limit() -> u32 {
    10_000
}

fn default_reference_fields() -> Vec<ReferenceField> {
    vec![
        ReferenceField::new(
            "clinicalDiagnosis",
            "clinical_diagnosis",
            UnmappedFallback::Raw,
        ),
        ReferenceField::new(
            "clinicalStatus",
            "clinical_status",
            UnmappedFallback::NotSpecified,
        ),
    ]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            base_url: default_base_url(),
            login_name: String::new(),
            password: None,
            domain_name: default_domain_name(),
            poll_interval_secs: default_poll_interval_secs(),
            max_wait_secs: default_max_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            audit_window_days: default_audit_window_days(),
            preamble_lines: default_preamble_lines(),
            raw_member_prefix: default_raw_member_prefix(),
            audit_entity: default_audit_entity(),
            permissible_value_limit: default_permissible_value_limit(),
            reference_fields: default_reference_fields(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &ExporterPaths) -> Result<Self, ExportError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| ExportError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ExporterPaths) -> Result<(), ExportError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| ExportError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Apply `OS_BASE_URL`, `OS_LOGIN_NAME`, `OS_PASSWORD` and `OS_DOMAIN_NAME`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OS_BASE_URL") {
            self.base_url = url;
        }
        if let Some(login) = lookup("OS_LOGIN_NAME") {
            self.login_name = login;
        }
        if let Some(password) = lookup("OS_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(domain) = lookup("OS_DOMAIN_NAME") {
            self.domain_name = domain;
        }
    }

    /// Check that the settings are usable for talking to the API
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.base_url.trim().is_empty() {
            return Err(ExportError::Config("base_url must not be empty".into()));
        }
        if self.login_name.trim().is_empty() {
            return Err(ExportError::Config(
                "login_name is not set (edit the config file or set OS_LOGIN_NAME)".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(ExportError::Config(
                "poll_interval_secs must be greater than zero".into(),
            ));
        }
        if !(1..=MAX_AUDIT_WINDOW_DAYS).contains(&self.audit_window_days) {
            return Err(ExportError::Config(format!(
                "audit_window_days must be between 1 and {}",
                MAX_AUDIT_WINDOW_DAYS
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
