//! Change-log value normalization
//!
//! Reference fields carry encoded permissible-value ids such as
//! `{id=123, value=...}`. They are resolved to display labels through the
//! permissible-value tables; anything still left in the bare `{id=<digits>}`
//! shape afterwards is reported as "Not Specified".

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::{ReferenceField, UnmappedFallback};
use crate::models::{PermissibleValueTables, NOT_SPECIFIED};

/// Change-log field holding the event's own label; never a column
pub const EVENT_LABEL_FIELD: &str = "eventLabel";

fn embedded_id_re() -> &'static Regex {
    static EMBEDDED_ID_RE: OnceLock<Regex> = OnceLock::new();
    EMBEDDED_ID_RE.get_or_init(|| Regex::new(r"id=(\d+)").expect("valid embedded id regex"))
}

fn bare_reference_re() -> &'static Regex {
    static BARE_REFERENCE_RE: OnceLock<Regex> = OnceLock::new();
    BARE_REFERENCE_RE
        .get_or_init(|| Regex::new(r"^\{id=\d+\}$").expect("valid bare reference regex"))
}

/// Extract the digits of the first `id=<digits>` in a value
pub fn extract_id(value: &str) -> Option<&str> {
    embedded_id_re()
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether a value is an unresolved `{id=<digits>}` reference
pub fn is_bare_reference(value: &str) -> bool {
    bare_reference_re().is_match(value.trim())
}

/// Maps raw change-log values to display values
#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    references: HashMap<String, ReferenceField>,
    tables: PermissibleValueTables,
}

impl ValueNormalizer {
    pub fn new(reference_fields: &[ReferenceField], tables: PermissibleValueTables) -> Self {
        let references = reference_fields
            .iter()
            .map(|r| (r.field.clone(), r.clone()))
            .collect();
        Self { references, tables }
    }

    /// Display value for a field, or `None` when the field is not auditable
    pub fn normalize(&self, field: &str, raw: &str) -> Option<String> {
        if field == EVENT_LABEL_FIELD {
            return None;
        }

        let value = match self.references.get(field) {
            Some(reference) => self.resolve_reference(reference, raw),
            None => raw.to_string(),
        };

        if is_bare_reference(&value) {
            Some(NOT_SPECIFIED.to_string())
        } else {
            Some(value)
        }
    }

    fn resolve_reference(&self, reference: &ReferenceField, raw: &str) -> String {
        let label = extract_id(raw).and_then(|id| self.tables.label(&reference.attribute, id));

        match (label, reference.fallback) {
            (Some(label), _) => label.to_string(),
            (None, UnmappedFallback::Raw) => raw.to_string(),
            (None, UnmappedFallback::NotSpecified) => NOT_SPECIFIED.to_string(),
        }
    }
}
