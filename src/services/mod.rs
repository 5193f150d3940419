//! Service layer for os-event-export
//!
//! The service layer drives the API client and the audit pipeline: listing
//! events, loading permissible values, and running per-event audit exports.

pub mod audit_export;
pub mod events;

pub use audit_export::{AuditExportService, AuditRunSummary, EventOutcome, ExportOptions};
pub use events::EventService;
