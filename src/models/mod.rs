//! Core data models for os-event-export
//!
//! This module contains the data structures of the export domain: events,
//! permissible value tables and the audit change records pivoted into wide
//! tables.

pub mod audit;
pub mod event;
pub mod permissible;

pub use audit::{AuditKey, ChangeLogEntry, WideRow, WideTable, WIDE_FIXED_COLUMNS};
pub use event::{Event, EVENT_COLUMNS};
pub use permissible::{PermissibleValueMap, PermissibleValueTables, NOT_SPECIFIED};
