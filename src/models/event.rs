//! Collection protocol event model
//!
//! Events are owned by the OpenSpecimen server; this crate only reads them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A collection protocol event as returned by the events listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Server-assigned record id
    pub id: i64,

    /// Event label shown in the protocol
    #[serde(rename = "eventLabel", default, deserialize_with = "null_as_empty")]
    pub label: String,

    #[serde(rename = "collectionProtocol", default)]
    pub collection_protocol: Option<Value>,

    #[serde(rename = "defaultSite", default)]
    pub default_site: Option<Value>,

    #[serde(rename = "clinicalDiagnosis", default)]
    pub clinical_diagnosis: Option<Value>,

    #[serde(rename = "clinicalStatus", default)]
    pub clinical_status: Option<Value>,

    #[serde(rename = "activityStatus", default)]
    pub activity_status: Option<Value>,

    #[serde(default)]
    pub code: Option<Value>,
}

impl Event {
    /// Create an event with only its identity populated
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            collection_protocol: None,
            default_site: None,
            clinical_diagnosis: None,
            clinical_status: None,
            activity_status: None,
            code: None,
        }
    }

    /// Cells for the simple events export, in column order
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.label.clone(),
            display_value(self.collection_protocol.as_ref()),
            display_value(self.default_site.as_ref()),
            display_value(self.clinical_diagnosis.as_ref()),
            display_value(self.clinical_status.as_ref()),
            display_value(self.activity_status.as_ref()),
            display_value(self.code.as_ref()),
        ]
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Header of the simple events export
pub const EVENT_COLUMNS: [&str; 8] = [
    "ID",
    "Event Label",
    "Collection Protocol",
    "defaultSite",
    "clinicalDiagnosis",
    "clinicalStatus",
    "activityStatus",
    "code",
];

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Render a loosely-typed JSON value as a CSV cell
fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
