//! OpenSpecimen REST API access
//!
//! The services only talk to the server through [`OpenSpecimenApi`], so
//! they can be driven by an in-memory fake in tests. [`HttpOpenSpecimenClient`]
//! is the blocking HTTP implementation holding an authenticated session.

pub mod client;
pub mod types;

pub use client::HttpOpenSpecimenClient;
pub use types::RevisionsExportRequest;

use crate::error::ExportResult;
use crate::models::{Event, PermissibleValueMap};

/// State of an audit export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportFile {
    /// The archive is available
    Ready(Vec<u8>),
    /// The export job has not produced the file yet
    NotReady,
}

/// Calls made against an authenticated OpenSpecimen session
pub trait OpenSpecimenApi {
    /// Events of a collection protocol, in server order
    fn list_events(&self, cp_id: &str) -> ExportResult<Vec<Event>>;

    /// All permissible values of an attribute
    fn permissible_values(&self, attribute: &str) -> ExportResult<PermissibleValueMap>;

    /// Start an audit revisions export, returning the file id to poll for
    fn request_revisions_export(&self, request: &RevisionsExportRequest) -> ExportResult<String>;

    /// Fetch an export file by id
    fn fetch_export_file(&self, file_id: &str) -> ExportResult<ExportFile>;
}
