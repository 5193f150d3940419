//! Blocking HTTP client for the OpenSpecimen REST API

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use tracing::{debug, info};

use super::types::{
    ExportJobResponse, LoginRequest, LoginResponse, PermissibleValueDto, RevisionsExportRequest,
};
use super::{ExportFile, OpenSpecimenApi};
use crate::config::Settings;
use crate::error::{ExportError, ExportResult};
use crate::models::{Event, PermissibleValueMap};

/// Header carrying the session token
pub const TOKEN_HEADER: &str = "X-OS-API-TOKEN";

/// An authenticated OpenSpecimen session
pub struct HttpOpenSpecimenClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl HttpOpenSpecimenClient {
    /// Open a session with the configured credentials
    ///
    /// # Errors
    ///
    /// Any non-success response is returned as [`ExportError::Http`].
    pub fn login(settings: &Settings, password: &str) -> ExportResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ExportError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let base_url = settings.base_url.trim_end_matches('/').to_string();

        let response = http
            .post(format!("{}/rest/ng/sessions", base_url))
            .json(&LoginRequest {
                login_name: &settings.login_name,
                password,
                domain_name: &settings.domain_name,
            })
            .send()?;
        let login: LoginResponse = check_status(response)?.json()?;

        info!(base_url = %base_url, user = %settings.login_name, "opened OpenSpecimen session");

        Ok(Self {
            http,
            base_url,
            token: login.token,
            page_size: settings.permissible_value_limit,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/ng/{}", self.base_url, path)
    }
}

/// Turn a non-success response into an error carrying its body
fn check_status(response: Response) -> ExportResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .unwrap_or_else(|_| "<response body unavailable>".to_string());
    Err(ExportError::http(status.as_u16(), body))
}

impl OpenSpecimenApi for HttpOpenSpecimenClient {
    fn list_events(&self, cp_id: &str) -> ExportResult<Vec<Event>> {
        let response = self
            .http
            .get(self.url("collection-protocol-events"))
            .query(&[("cpId", cp_id)])
            .header(TOKEN_HEADER, &self.token)
            .send()?;
        let events: Vec<Event> = check_status(response)?.json()?;

        debug!(cp_id, count = events.len(), "listed collection protocol events");
        Ok(events)
    }

    fn permissible_values(&self, attribute: &str) -> ExportResult<PermissibleValueMap> {
        let page_size = self.page_size.to_string();
        let response = self
            .http
            .get(self.url("permissible-values"))
            .query(&[("attribute", attribute), ("maxResults", page_size.as_str())])
            .header(TOKEN_HEADER, &self.token)
            .send()?;
        let values: Vec<PermissibleValueDto> = check_status(response)?.json()?;

        let map: PermissibleValueMap = values
            .iter()
            .filter_map(|v| v.id_string().map(|id| (id, v.label())))
            .collect();

        debug!(attribute, count = map.len(), "loaded permissible values");
        Ok(map)
    }

    fn request_revisions_export(&self, request: &RevisionsExportRequest) -> ExportResult<String> {
        let response = self
            .http
            .post(self.url("audit/export-revisions"))
            .header(TOKEN_HEADER, &self.token)
            .json(request)
            .send()?;
        let job: ExportJobResponse = check_status(response)?.json()?;

        job.file_id().ok_or_else(|| {
            ExportError::Validation("Export-revisions response has no fileId".to_string())
        })
    }

    fn fetch_export_file(&self, file_id: &str) -> ExportResult<ExportFile> {
        let response = self
            .http
            .get(self.url("audit/revisions-file"))
            .query(&[("fileId", file_id)])
            .header(TOKEN_HEADER, &self.token)
            .send()?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ExportFile::NotReady);
        }

        let bytes = check_status(response)?.bytes()?;
        Ok(ExportFile::Ready(bytes.to_vec()))
    }
}
