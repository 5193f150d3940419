//! Export module for os-event-export
//!
//! Provides the CSV outputs of the tool:
//! - Events listing for a collection protocol
//! - Per-event wide audit tables
//! - The merged audit file built from all wide tables

pub mod csv;
pub mod merge;

pub use self::csv::{export_events_csv, export_wide_csv, write_to_file};
pub use merge::{list_wide_files, merge_csv_files, merge_wide_csvs, MergeSummary};
