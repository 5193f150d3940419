//! os-event-export - OpenSpecimen event and audit history exporter
//!
//! This library exports the collection protocol events of an OpenSpecimen
//! server to CSV, and turns their audit revisions into wide CSVs with one row
//! per audit action and one column per changed field.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings, path resolution and output file naming
//! - `error`: Custom error types
//! - `models`: Events, permissible values and audit tables
//! - `api`: OpenSpecimen REST client behind the `OpenSpecimenApi` trait
//! - `audit`: Change-log parsing, value normalization and the wide transform
//! - `export`: CSV writers and the merge of per-event files
//! - `services`: Event listing and audit export orchestration
//! - `cli`: Command handlers
//! - `display`: Terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use os_event_export::config::{ExporterPaths, Settings};
//!
//! let paths = ExporterPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! ```

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;

pub use error::{ExportError, ExportResult};
