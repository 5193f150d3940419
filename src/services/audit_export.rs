//! Audit export orchestration
//!
//! For every event: request a revisions export, poll until the archive is
//! available, extract the raw audit CSV, pivot it into a wide CSV and drop
//! the raw file. A failing event is logged and skipped; the remaining events
//! still run. All wide CSVs are merged into one file at the end.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::api::{ExportFile, OpenSpecimenApi, RevisionsExportRequest};
use crate::audit::{extract_raw_member, AuditTransformer, ValueNormalizer};
use crate::config::{OutputLayout, Settings};
use crate::error::{ExportError, ExportResult};
use crate::export::{export_wide_csv, merge_wide_csvs, write_to_file, MergeSummary};
use crate::models::Event;

/// Tunables of one audit export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub window_days: i64,
    pub preamble_lines: usize,
    pub raw_member_prefix: String,
    pub entity: String,
}

impl ExportOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            max_wait: settings.max_wait(),
            window_days: settings.audit_window_days,
            preamble_lines: settings.preamble_lines,
            raw_member_prefix: settings.raw_member_prefix.clone(),
            entity: settings.audit_entity.clone(),
        }
    }
}

/// Outcome for a single event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// Wide CSV written
    Exported {
        event: Event,
        path: PathBuf,
        rows: usize,
    },
    /// Export abandoned for this event
    Failed { event: Event, error: String },
}

impl EventOutcome {
    pub fn event(&self) -> &Event {
        match self {
            Self::Exported { event, .. } | Self::Failed { event, .. } => event,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Everything an audit run produced
#[derive(Debug, Clone, Default)]
pub struct AuditRunSummary {
    pub outcomes: Vec<EventOutcome>,
    /// Merged file and its statistics, when at least one wide CSV existed
    pub merged: Option<(PathBuf, MergeSummary)>,
}

impl AuditRunSummary {
    pub fn exported_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &EventOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

/// Service running audit exports for a list of events
pub struct AuditExportService<'a, A: OpenSpecimenApi + ?Sized> {
    api: &'a A,
    normalizer: &'a ValueNormalizer,
    options: ExportOptions,
}

impl<'a, A: OpenSpecimenApi + ?Sized> AuditExportService<'a, A> {
    /// Create a new audit export service
    pub fn new(api: &'a A, normalizer: &'a ValueNormalizer, options: ExportOptions) -> Self {
        Self {
            api,
            normalizer,
            options,
        }
    }

    /// Export every event, then merge the wide CSVs
    ///
    /// Per-event failures end up in the summary; only failures to prepare
    /// the output folder or to merge are returned as errors.
    pub fn run(&self, events: &[Event], layout: &OutputLayout) -> ExportResult<AuditRunSummary> {
        let audit_dir = layout.audit_dir();
        std::fs::create_dir_all(&audit_dir).map_err(|e| {
            ExportError::Io(format!(
                "Failed to create output folder {}: {}",
                audit_dir.display(),
                e
            ))
        })?;

        let mut summary = AuditRunSummary::default();
        for (idx, event) in events.iter().enumerate() {
            info!(
                event_id = event.id,
                label = %event.label,
                "exporting audit history ({}/{})",
                idx + 1,
                events.len()
            );

            let outcome = match self.export_event(event, layout, Utc::now()) {
                Ok((path, rows)) => {
                    info!(event_id = event.id, rows, path = %path.display(), "wrote wide audit CSV");
                    EventOutcome::Exported {
                        event: event.clone(),
                        path,
                        rows,
                    }
                }
                Err(e) => {
                    error!(event_id = event.id, label = %event.label, error = %e, "audit export failed, skipping event");
                    EventOutcome::Failed {
                        event: event.clone(),
                        error: e.to_string(),
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        let merged_path = layout.merged_audit_file();
        summary.merged = merge_wide_csvs(&audit_dir, &merged_path)?.map(|m| (merged_path, m));

        Ok(summary)
    }

    /// Run one event through request, poll, extract and transform
    pub fn export_event(
        &self,
        event: &Event,
        layout: &OutputLayout,
        now: DateTime<Utc>,
    ) -> ExportResult<(PathBuf, usize)> {
        let request = RevisionsExportRequest::trailing_window(
            event.id,
            self.options.entity.clone(),
            self.options.window_days,
            now,
        )?;
        let file_id = self.api.request_revisions_export(&request)?;
        debug!(event_id = event.id, file_id = %file_id, "export requested");

        let archive = self.wait_for_file(&file_id)?;

        let raw_path = layout.raw_audit_file(event.id);
        extract_raw_member(&archive, &self.options.raw_member_prefix, &raw_path)?;

        let transformer = AuditTransformer::new(self.normalizer, self.options.preamble_lines);
        let table = transformer.transform_file(&raw_path, event)?;

        let wide_path = layout.wide_audit_file(event.id, &event.label);
        write_to_file(&wide_path, |w| export_wide_csv(&table, w))?;

        std::fs::remove_file(&raw_path).map_err(|e| {
            ExportError::Io(format!(
                "Failed to remove raw audit file {}: {}",
                raw_path.display(),
                e
            ))
        })?;

        Ok((wide_path, table.rows().len()))
    }

    /// Poll for an export file until it is ready or the wait budget is spent
    pub fn wait_for_file(&self, file_id: &str) -> ExportResult<Vec<u8>> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.api.fetch_export_file(file_id)? {
                ExportFile::Ready(bytes) => {
                    debug!(file_id, attempts, bytes = bytes.len(), "export file ready");
                    return Ok(bytes);
                }
                ExportFile::NotReady => {
                    let waited = started.elapsed();
                    if waited >= self.options.max_wait {
                        return Err(ExportError::Timeout {
                            file_id: file_id.to_string(),
                            waited_secs: waited.as_secs(),
                        });
                    }
                    debug!(file_id, attempts, "export file not ready yet");
                    thread::sleep(self.options.poll_interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::archive::tests::zip_bytes;
    use crate::models::{PermissibleValueMap, PermissibleValueTables, NOT_SPECIFIED};
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use tempfile::TempDir;

    const DELAY: Duration = Duration::from_millis(20);

    /// Scripted reply to one export file poll
    #[derive(Clone)]
    enum Poll {
        NotReady,
        Ready(Vec<u8>),
        Fail(u16),
    }

    #[derive(Default)]
    struct FakeApi {
        /// Scripted polls per event id; the last entry repeats forever
        polls: HashMap<i64, Vec<Poll>>,
        /// Event ids whose export request is rejected
        rejected: Vec<i64>,
        queues: RefCell<HashMap<String, VecDeque<Poll>>>,
        requests: RefCell<Vec<RevisionsExportRequest>>,
    }

    impl OpenSpecimenApi for FakeApi {
        fn list_events(&self, _cp_id: &str) -> ExportResult<Vec<Event>> {
            Ok(Vec::new())
        }

        fn permissible_values(&self, _attribute: &str) -> ExportResult<PermissibleValueMap> {
            Ok(PermissibleValueMap::new())
        }

        fn request_revisions_export(&self, request: &RevisionsExportRequest) -> ExportResult<String> {
            self.requests.borrow_mut().push(request.clone());
            let id = request.record_ids[0];
            if self.rejected.contains(&id) {
                return Err(ExportError::http(400, "Invalid record id"));
            }
            let file_id = format!("file-{}", id);
            let script = self.polls.get(&id).cloned().unwrap_or_default();
            self.queues
                .borrow_mut()
                .insert(file_id.clone(), script.into_iter().collect());
            Ok(file_id)
        }

        fn fetch_export_file(&self, file_id: &str) -> ExportResult<ExportFile> {
            let mut queues = self.queues.borrow_mut();
            let queue = queues.get_mut(file_id).unwrap();
            let poll = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            };
            match poll {
                Poll::NotReady => Ok(ExportFile::NotReady),
                Poll::Ready(bytes) => Ok(ExportFile::Ready(bytes)),
                Poll::Fail(status) => Err(ExportError::http(status, "server error")),
            }
        }
    }

    fn raw_csv(rows: &str) -> String {
        format!(
            "Audit Revisions\nExported By,admin\nExported On,today\nEntity,CPE\nIds,1\n\nTimestamp,User,Operation,Change Log\n{}",
            rows
        )
    }

    fn archive(rows: &str) -> Vec<u8> {
        let raw = raw_csv(rows);
        zip_bytes(&[("revisions_1.csv", raw.as_str()), ("info.txt", "x")])
    }

    fn options(max_wait: Duration) -> ExportOptions {
        ExportOptions {
            poll_interval: DELAY,
            max_wait,
            ..ExportOptions::from_settings(&Settings::default())
        }
    }

    fn normalizer() -> ValueNormalizer {
        let mut tables = PermissibleValueTables::new();
        tables.insert("clinical_status", PermissibleValueMap::new());
        tables.insert("clinical_diagnosis", PermissibleValueMap::new());
        ValueNormalizer::new(&Settings::default().reference_fields, tables)
    }

    #[test]
    fn test_wait_for_file_waits_between_polls() {
        let bytes = vec![7u8, 8, 9];
        let api = FakeApi {
            polls: HashMap::from([(
                1,
                vec![
                    Poll::NotReady,
                    Poll::NotReady,
                    Poll::NotReady,
                    Poll::Ready(bytes.clone()),
                ],
            )]),
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service = AuditExportService::new(&api, &normalizer, options(Duration::from_secs(10)));

        let request = RevisionsExportRequest::trailing_window(1, "CPE", 365, Utc::now()).unwrap();
        let file_id = api.request_revisions_export(&request).unwrap();

        let started = Instant::now();
        let result = service.wait_for_file(&file_id).unwrap();

        assert_eq!(result, bytes);
        assert!(started.elapsed() >= DELAY * 3);
    }

    #[test]
    fn test_wait_for_file_times_out() {
        let api = FakeApi {
            polls: HashMap::from([(1, vec![Poll::NotReady])]),
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service =
            AuditExportService::new(&api, &normalizer, options(Duration::from_millis(60)));

        let request = RevisionsExportRequest::trailing_window(1, "CPE", 365, Utc::now()).unwrap();
        let file_id = api.request_revisions_export(&request).unwrap();

        let err = service.wait_for_file(&file_id).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_wait_for_file_other_error_is_fatal() {
        let api = FakeApi {
            polls: HashMap::from([(1, vec![Poll::NotReady, Poll::Fail(500)])]),
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service = AuditExportService::new(&api, &normalizer, options(Duration::from_secs(10)));

        let request = RevisionsExportRequest::trailing_window(1, "CPE", 365, Utc::now()).unwrap();
        let file_id = api.request_revisions_export(&request).unwrap();

        assert!(matches!(
            service.wait_for_file(&file_id),
            Err(ExportError::Http { status: 500, .. })
        ));
    }

    #[test]
    fn test_export_event_writes_wide_and_removes_raw() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");
        std::fs::create_dir_all(layout.audit_dir()).unwrap();

        let api = FakeApi {
            polls: HashMap::from([(
                1,
                vec![Poll::Ready(archive(
                    "T1,U1,UPDATE,\"clinicalStatus={id=5}, note=ok\"\n",
                ))],
            )]),
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service = AuditExportService::new(&api, &normalizer, options(Duration::from_secs(1)));
        let now = Utc::now();

        let (path, rows) = service
            .export_event(&Event::new(1, "Baseline"), &layout, now)
            .unwrap();

        assert_eq!(rows, 1);
        assert_eq!(path, layout.wide_audit_file(1, "Baseline"));
        assert!(!layout.raw_audit_file(1).exists());

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "Modified Date,Modified By,Operation,Event ID,Event Label,clinicalStatus,note"
        );
        assert_eq!(lines[1], format!("T1,U1,UPDATE,1,Baseline,{},ok", NOT_SPECIFIED));

        let request = &api.requests.borrow()[0];
        assert_eq!(request.entities, vec!["CollectionProtocolEvent"]);
        assert_eq!(request.end_date, now.timestamp_millis());
    }

    #[test]
    fn test_export_event_archive_without_member_fails() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");
        std::fs::create_dir_all(layout.audit_dir()).unwrap();

        let api = FakeApi {
            polls: HashMap::from([(1, vec![Poll::Ready(zip_bytes(&[("other.csv", "x")]))])]),
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service = AuditExportService::new(&api, &normalizer, options(Duration::from_secs(1)));

        let err = service
            .export_event(&Event::new(1, "Baseline"), &layout, Utc::now())
            .unwrap_err();
        assert!(matches!(err, ExportError::Archive(_)));
    }

    #[test]
    fn test_run_isolates_failures_and_merges() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");

        let api = FakeApi {
            polls: HashMap::from([
                (1, vec![Poll::NotReady]),
                (3, vec![Poll::NotReady, Poll::Ready(archive("T1,U1,UPDATE,a=1\n"))]),
                (4, vec![Poll::Ready(archive("T2,U2,INSERT,b=2\n"))]),
            ]),
            rejected: vec![2],
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service =
            AuditExportService::new(&api, &normalizer, options(Duration::from_millis(60)));
        let events = vec![
            Event::new(1, "Never Ready"),
            Event::new(2, "Rejected"),
            Event::new(3, "Slow"),
            Event::new(4, "Fast"),
        ];

        let summary = service.run(&events, &layout).unwrap();

        assert_eq!(summary.outcomes.len(), 4);
        assert_eq!(summary.exported_count(), 2);
        let failed: Vec<_> = summary.failed().map(|o| o.event().id).collect();
        assert_eq!(failed, vec![1, 2]);

        let (merged_path, merge) = summary.merged.unwrap();
        assert_eq!(merged_path, layout.merged_audit_file());
        assert_eq!(merge.files, 2);
        assert_eq!(merge.rows, 2);

        let merged = std::fs::read_to_string(merged_path).unwrap();
        assert!(merged.starts_with("Modified Date,Modified By,Operation,Event ID,Event Label,a,b\n"));
    }

    #[test]
    fn test_run_with_all_failures_writes_no_merge() {
        let temp_dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(temp_dir.path(), "7");
        let api = FakeApi {
            rejected: vec![1],
            ..FakeApi::default()
        };
        let normalizer = normalizer();
        let service = AuditExportService::new(&api, &normalizer, options(Duration::from_secs(1)));

        let summary = service.run(&[Event::new(1, "A")], &layout).unwrap();

        assert_eq!(summary.exported_count(), 0);
        assert!(summary.merged.is_none());
        assert!(!layout.merged_audit_file().exists());
    }
}
