//! Wire types of the OpenSpecimen REST API

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExportError, ExportResult};
use crate::models::NOT_SPECIFIED;

/// Body of `POST /rest/ng/sessions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub login_name: &'a str,
    pub password: &'a str,
    pub domain_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// One entry of a permissible-value listing
#[derive(Debug, Clone, Deserialize)]
pub struct PermissibleValueDto {
    pub id: Value,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PermissibleValueDto {
    /// Id as used inside change logs
    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Display label: `value`, then `name`, then "Not Specified"
    pub fn label(&self) -> String {
        [self.value.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|label| !label.is_empty())
            .unwrap_or(NOT_SPECIFIED)
            .to_string()
    }
}

/// Body of `POST /rest/ng/audit/export-revisions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionsExportRequest {
    pub record_ids: Vec<i64>,
    pub entities: Vec<String>,
    /// Window start, epoch milliseconds
    pub start_date: i64,
    /// Window end, epoch milliseconds
    pub end_date: i64,
}

impl RevisionsExportRequest {
    /// Request covering the `window_days` preceding `now` for one record
    pub fn trailing_window(
        record_id: i64,
        entity: impl Into<String>,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> ExportResult<Self> {
        let start = Duration::try_days(window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                ExportError::Config(format!("audit window of {} days is out of range", window_days))
            })?;
        Ok(Self {
            record_ids: vec![record_id],
            entities: vec![entity.into()],
            start_date: start.timestamp_millis(),
            end_date: now.timestamp_millis(),
        })
    }
}

/// Response of an export-revisions request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobResponse {
    #[serde(default)]
    pub file_id: Option<Value>,
}

impl ExportJobResponse {
    pub fn file_id(&self) -> Option<String> {
        match self.file_id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
