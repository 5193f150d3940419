//! Configuration module for os-event-export
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Output file naming
//! - Persisted settings with environment overrides

pub mod paths;
pub mod settings;

pub use paths::{ExporterPaths, OutputLayout};
pub use settings::{ReferenceField, Settings, UnmappedFallback};
