//! Audit models
//!
//! A raw audit export has one row per change record; the wide table pivots
//! those into one row per audit action keyed by timestamp, user and
//! operation, with one column per changed field.

use std::collections::{BTreeSet, HashMap};

/// A single `field = value` pair from a change log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub field: String,
    pub value: String,
}

impl ChangeLogEntry {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Identifies one audit action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuditKey {
    pub timestamp: String,
    pub user: String,
    pub operation: String,
}

impl AuditKey {
    pub fn new(
        timestamp: impl Into<String>,
        user: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            user: user.into(),
            operation: operation.into(),
        }
    }
}

/// Leading columns of every wide CSV, before the discovered field columns
pub const WIDE_FIXED_COLUMNS: [&str; 5] = [
    "Modified Date",
    "Modified By",
    "Operation",
    "Event ID",
    "Event Label",
];

/// One row of the wide table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideRow {
    pub key: AuditKey,
    pub values: HashMap<String, String>,
}

/// Audit actions pivoted to one row each
///
/// Rows keep the order in which their key was first seen. Field columns are
/// the sorted union of every field recorded into any row.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    event_id: i64,
    event_label: String,
    rows: Vec<WideRow>,
    index: HashMap<AuditKey, usize>,
    fields: BTreeSet<String>,
}

impl WideTable {
    pub fn new(event_id: i64, event_label: impl Into<String>) -> Self {
        Self {
            event_id,
            event_label: event_label.into(),
            ..Self::default()
        }
    }

    /// Record a field value for an audit action, overwriting an earlier
    /// value of the same field under the same key
    pub fn record(&mut self, key: &AuditKey, field: &str, value: String) {
        let idx = self.ensure_row(key);
        self.fields.insert(field.to_string());
        self.rows[idx].values.insert(field.to_string(), value);
    }

    /// Register an audit action, returning the index of its row
    ///
    /// An action keeps its row even when none of its fields produce a column.
    pub fn ensure_row(&mut self, key: &AuditKey) -> usize {
        if let Some(&idx) = self.index.get(key) {
            return idx;
        }
        self.rows.push(WideRow {
            key: key.clone(),
            values: HashMap::new(),
        });
        let idx = self.rows.len() - 1;
        self.index.insert(key.clone(), idx);
        idx
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Discovered field columns in lexicographic order
    pub fn fields(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }

    /// Full header: fixed columns then field columns
    pub fn header(&self) -> Vec<String> {
        WIDE_FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.fields.iter().cloned())
            .collect()
    }

    /// Rows projected over the full header, absent fields as empty cells
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        let event_id = self.event_id.to_string();
        self.rows.iter().map(move |row| {
            let mut record = vec![
                row.key.timestamp.clone(),
                row.key.user.clone(),
                row.key.operation.clone(),
                event_id.clone(),
                self.event_label.clone(),
            ];
            record.extend(
                self.fields
                    .iter()
                    .map(|f| row.values.get(f).cloned().unwrap_or_default()),
            );
            record
        })
    }
}
