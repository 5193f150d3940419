//! Event listing service
//!
//! Fetches the events of a collection protocol and the permissible-value
//! tables needed to normalize their audit history.

use std::path::PathBuf;

use tracing::info;

use crate::api::OpenSpecimenApi;
use crate::config::{OutputLayout, ReferenceField};
use crate::error::ExportResult;
use crate::export::{export_events_csv, write_to_file};
use crate::models::{Event, PermissibleValueTables};

/// Service for collection protocol events
pub struct EventService<'a, A: OpenSpecimenApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: OpenSpecimenApi + ?Sized> EventService<'a, A> {
    /// Create a new event service
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// List the events of a collection protocol
    pub fn list(&self, cp_id: &str) -> ExportResult<Vec<Event>> {
        self.api.list_events(cp_id)
    }

    /// Write `cp_<id>_events.csv`; `None` when the protocol has no events
    pub fn export_csv(&self, cp_id: &str, layout: &OutputLayout) -> ExportResult<Option<(PathBuf, usize)>> {
        let events = self.list(cp_id)?;
        if events.is_empty() {
            return Ok(None);
        }

        std::fs::create_dir_all(layout.output_dir())?;
        let path = layout.events_file();
        write_to_file(&path, |w| export_events_csv(&events, w))?;

        info!(cp_id, count = events.len(), path = %path.display(), "exported events");
        Ok(Some((path, events.len())))
    }

    /// Load one permissible-value map per distinct reference attribute
    pub fn load_permissible_values(
        &self,
        reference_fields: &[ReferenceField],
    ) -> ExportResult<PermissibleValueTables> {
        let mut tables = PermissibleValueTables::new();
        for reference in reference_fields {
            if tables.get(&reference.attribute).is_some() {
                continue;
            }
            let map = self.api.permissible_values(&reference.attribute)?;
            tables.insert(reference.attribute.clone(), map);
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ExportFile, RevisionsExportRequest};
    use crate::config::{Settings, UnmappedFallback};
    use crate::error::ExportError;
    use crate::models::PermissibleValueMap;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct StubApi {
        events: Vec<Event>,
        attribute_calls: RefCell<Vec<String>>,
    }

    impl OpenSpecimenApi for StubApi {
        fn list_events(&self, _cp_id: &str) -> ExportResult<Vec<Event>> {
            Ok(self.events.clone())
        }

        fn permissible_values(&self, attribute: &str) -> ExportResult<PermissibleValueMap> {
            self.attribute_calls.borrow_mut().push(attribute.to_string());
            Ok([("1", format!("{} label", attribute))].into_iter().collect())
        }

        fn request_revisions_export(&self, _: &RevisionsExportRequest) -> ExportResult<String> {
            Err(ExportError::Validation("not used".into()))
        }

        fn fetch_export_file(&self, _: &str) -> ExportResult<ExportFile> {
            Ok(ExportFile::NotReady)
        }
    }

    #[test]
    fn test_export_csv_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");
        let api = StubApi {
            events: vec![Event::new(1, "Baseline"), Event::new(2, "Month 6")],
            ..StubApi::default()
        };

        let (path, count) = EventService::new(&api)
            .export_csv("7", &layout)
            .unwrap()
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(path, temp_dir.path().join("cp_7_events.csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_export_csv_no_events() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");
        let api = StubApi::default();

        let result = EventService::new(&api).export_csv("7", &layout).unwrap();

        assert!(result.is_none());
        assert!(!layout.events_file().exists());
    }

    #[test]
    fn test_load_permissible_values_once_per_attribute() {
        let api = StubApi::default();
        let mut fields = Settings::default().reference_fields;
        fields.push(ReferenceField::new(
            "primaryDiagnosis",
            "clinical_diagnosis",
            UnmappedFallback::Raw,
        ));

        let tables = EventService::new(&api)
            .load_permissible_values(&fields)
            .unwrap();

        assert_eq!(
            *api.attribute_calls.borrow(),
            vec!["clinical_diagnosis", "clinical_status"]
        );
        assert_eq!(
            tables.label("clinical_status", "1"),
            Some("clinical_status label")
        );
    }
}
