//! Permissible value lookup tables
//!
//! A permissible value is a controlled-vocabulary entry (id + display label).
//! Tables are built once per run and only read afterwards.

use std::collections::HashMap;

/// Display label used whenever a value cannot be resolved
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Id-to-label mapping for a single attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissibleValueMap {
    labels: HashMap<String, String>,
}

impl PermissibleValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mapped ids
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Look up the display label for a string-encoded id
    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for PermissibleValueMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            labels: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Permissible value maps keyed by attribute name
#[derive(Debug, Clone, Default)]
pub struct PermissibleValueTables {
    by_attribute: HashMap<String, PermissibleValueMap>,
}

impl PermissibleValueTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the map for an attribute, replacing any earlier one
    pub fn insert(&mut self, attribute: impl Into<String>, map: PermissibleValueMap) {
        self.by_attribute.insert(attribute.into(), map);
    }

    pub fn get(&self, attribute: &str) -> Option<&PermissibleValueMap> {
        self.by_attribute.get(attribute)
    }

    /// Resolve an id within an attribute; `None` when either is unknown
    pub fn label(&self, attribute: &str, id: &str) -> Option<&str> {
        self.get(attribute).and_then(|map| map.label(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_lookup() {
        let map: PermissibleValueMap = [("5", "Active"), ("6", "Closed")].into_iter().collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.label("5"), Some("Active"));
        assert_eq!(map.label("7"), None);
    }

    #[test]
    fn test_tables_lookup() {
        let mut tables = PermissibleValueTables::new();
        tables.insert(
            "clinical_status",
            [("1", "Pre-Op")].into_iter().collect(),
        );

        assert_eq!(tables.label("clinical_status", "1"), Some("Pre-Op"));
        assert_eq!(tables.label("clinical_status", "2"), None);
        assert_eq!(tables.label("clinical_diagnosis", "1"), None);
    }
}
