//! Display formatting for terminal output
//!
//! Provides utilities for formatting run results for terminal display.

pub mod summary;

pub use summary::format_audit_summary;
