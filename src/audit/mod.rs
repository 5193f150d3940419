//! Audit history processing for os-event-export
//!
//! Turns the raw revisions export of the OpenSpecimen audit module into wide
//! tables with one row per audit action.
//!
//! # Architecture
//!
//! - `changelog`: splits a change-log cell into `field=value` entries, only
//!   on commas outside brackets and braces.
//! - `normalize`: resolves permissible-value references to display labels.
//! - `transform`: groups entries by (timestamp, user, operation) and pivots
//!   them into a `WideTable`.
//! - `archive`: pulls the raw audit CSV out of the downloaded zip archive.
//!
//! # Example
//!
//! ```rust,ignore
//! use os_event_export::audit::{AuditTransformer, ValueNormalizer};
//!
//! let normalizer = ValueNormalizer::new(&settings.reference_fields, tables);
//! let transformer = AuditTransformer::new(&normalizer, settings.preamble_lines);
//! let table = transformer.transform_file(&raw_path, &event)?;
//! ```

pub mod archive;
pub mod changelog;
pub mod normalize;
pub mod transform;

pub use archive::{extract_raw_member, find_raw_member};
pub use changelog::{parse_change_log, parse_entry, split_top_level};
pub use normalize::{ValueNormalizer, EVENT_LABEL_FIELD};
pub use transform::AuditTransformer;
