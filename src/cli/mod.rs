//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod export;
pub mod session;

pub use export::{handle_audit_command, handle_events_command, ExportArgs};
