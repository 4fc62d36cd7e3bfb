//! Application state store.
//!
//! One immutable `AppState` snapshot, a closed `Action` enum, and a pure
//! `reduce` transition. `Store` is the single writer; every dispatch
//! replaces the whole snapshot atomically, so partial-update races cannot
//! occur by construction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::trackers::TrackerPlatform;
use crate::types::{DailyRecordEntry, FileImportResult, GeneratedReport, TrackerData};

/// Active data-source tab. `Tracker` keeps the historical wire name `api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Daily,
    #[serde(rename = "api")]
    Tracker,
    File,
}

/// Tracker connection lifecycle: selected platform, entered credentials,
/// connected flag, and the last fetched graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConnection {
    pub platform: Option<TrackerPlatform>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub data: Option<TrackerData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadState {
    pub file_name: Option<String>,
    #[serde(default)]
    pub uploaded: bool,
    #[serde(default)]
    pub parsed: bool,
    #[serde(default)]
    pub data: Option<FileImportResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_job: String,
    /// Date-keyed free-text entries; one entry per date, last write wins.
    #[serde(default)]
    pub daily_records: BTreeMap<String, String>,
    #[serde(default)]
    pub connection: ApiConnection,
    #[serde(default)]
    pub file_upload: FileUploadState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub current_tab: Tab,
    pub user_input: UserInput,
    pub is_generating: bool,
    pub generated_reports: Vec<GeneratedReport>,
    pub current_report: Option<GeneratedReport>,
    pub error: Option<String>,
}

impl AppState {
    /// Fresh state with identity fields seeded from config.
    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::default();
        state.user_input.user_name = config.user_name.clone();
        state.user_input.user_job = config.user_job.clone();
        state
    }

    /// Entries of the daily-record mapping, in map (ascending-date) order.
    /// The aggregation pipeline owns sorting for report purposes.
    pub fn daily_record_entries(&self) -> Vec<DailyRecordEntry> {
        self.user_input
            .daily_records
            .iter()
            .map(|(date, content)| DailyRecordEntry::new(date.clone(), content.clone()))
            .collect()
    }
}

// =============================================================================
// Actions + transition
// =============================================================================

/// The closed set of state transitions. Nothing mutates `AppState` except
/// `reduce` applied to one of these.
#[derive(Debug, Clone)]
pub enum Action {
    SetTab(Tab),
    SetUserName(String),
    SetUserJob(String),
    AddDailyRecord(DailyRecordEntry),
    DeleteDailyRecord(String),
    /// Bulk replace, e.g. after a remote refresh.
    SetDailyRecords(BTreeMap<String, String>),
    /// Selecting a platform resets credentials, the connected flag, and any
    /// fetched data: credentials are never shared across platforms.
    SetPlatform(Option<TrackerPlatform>),
    SetApiKey(String),
    SetTokenKey(String),
    ConnectPlatform(bool),
    ConnectApiSuccess(TrackerData),
    SetFile(Option<String>),
    SetFileUploaded(bool),
    SetFileData(Option<FileImportResult>),
    SetFileParsed(bool),
    StartGeneration,
    GenerationSuccess(GeneratedReport),
    GenerationError(String),
    UpdateReportContent { report_id: String, content: String },
}

/// Pure transition function: returns the next snapshot, never mutating the
/// input and never performing I/O.
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::SetTab(tab) => next.current_tab = tab,
        Action::SetUserName(name) => next.user_input.user_name = name,
        Action::SetUserJob(job) => next.user_input.user_job = job,
        Action::AddDailyRecord(entry) => {
            next.user_input.daily_records.insert(entry.date, entry.content);
        }
        Action::DeleteDailyRecord(date) => {
            next.user_input.daily_records.remove(&date);
        }
        Action::SetDailyRecords(records) => next.user_input.daily_records = records,
        Action::SetPlatform(platform) => {
            next.user_input.connection = ApiConnection {
                platform,
                ..ApiConnection::default()
            };
        }
        Action::SetApiKey(key) => next.user_input.connection.api_key = key,
        Action::SetTokenKey(token) => next.user_input.connection.token = token,
        Action::ConnectPlatform(connected) => next.user_input.connection.connected = connected,
        Action::ConnectApiSuccess(data) => {
            next.user_input.connection.connected = true;
            next.user_input.connection.data = Some(data);
        }
        Action::SetFile(file_name) => next.user_input.file_upload.file_name = file_name,
        Action::SetFileUploaded(uploaded) => next.user_input.file_upload.uploaded = uploaded,
        Action::SetFileData(data) => next.user_input.file_upload.data = data,
        Action::SetFileParsed(parsed) => next.user_input.file_upload.parsed = parsed,
        Action::StartGeneration => {
            next.is_generating = true;
            next.error = None;
        }
        Action::GenerationSuccess(report) => {
            next.is_generating = false;
            next.error = None;
            next.current_report = Some(report.clone());
            next.generated_reports.push(report);
        }
        Action::GenerationError(message) => {
            next.is_generating = false;
            next.error = Some(message);
        }
        Action::UpdateReportContent { report_id, content } => {
            let is_current = next
                .current_report
                .as_ref()
                .map(|r| r.id == report_id)
                .unwrap_or(false);
            if is_current {
                if let Some(current) = next.current_report.as_mut() {
                    current.content = content.clone();
                }
                if let Some(entry) = next
                    .generated_reports
                    .iter_mut()
                    .find(|r| r.id == report_id)
                {
                    entry.content = content;
                }
            }
        }
    }
    next
}

/// Single-writer wrapper around the current snapshot.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    pub fn dispatch(&mut self, action: Action) -> &AppState {
        self.state = reduce(&self.state, action);
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReportSource, ReportStatus};

    fn report(content: &str) -> GeneratedReport {
        GeneratedReport::new(
            content.to_string(),
            ReportSource {
                daily_record: true,
                tracker_platform: None,
                file_uploaded: false,
            },
        )
    }

    #[test]
    fn test_add_and_delete_daily_records() {
        let mut store = Store::default();
        store.dispatch(Action::AddDailyRecord(DailyRecordEntry::new(
            "2025-01-02",
            "wrote importer",
        )));
        store.dispatch(Action::AddDailyRecord(DailyRecordEntry::new(
            "2025-01-02",
            "rewrote importer",
        )));
        assert_eq!(
            store.state().user_input.daily_records.get("2025-01-02"),
            Some(&"rewrote importer".to_string())
        );

        store.dispatch(Action::DeleteDailyRecord("2025-01-02".into()));
        assert!(store.state().user_input.daily_records.is_empty());
    }

    #[test]
    fn test_set_daily_records_replaces_wholesale() {
        let mut store = Store::default();
        store.dispatch(Action::AddDailyRecord(DailyRecordEntry::new(
            "2025-01-01",
            "old",
        )));

        let mut replacement = BTreeMap::new();
        replacement.insert("2025-02-01".to_string(), "new".to_string());
        store.dispatch(Action::SetDailyRecords(replacement));

        assert!(!store.state().user_input.daily_records.contains_key("2025-01-01"));
        assert_eq!(
            store.state().user_input.daily_records.get("2025-02-01"),
            Some(&"new".to_string())
        );
    }

    #[test]
    fn test_set_platform_resets_credentials_and_data() {
        let mut store = Store::default();
        store.dispatch(Action::SetPlatform(Some(TrackerPlatform::Jira)));
        store.dispatch(Action::SetApiKey("k".repeat(32)));
        store.dispatch(Action::SetTokenKey("secret".into()));
        store.dispatch(Action::ConnectPlatform(true));

        store.dispatch(Action::SetPlatform(Some(TrackerPlatform::Trello)));

        let connection = &store.state().user_input.connection;
        assert_eq!(connection.platform, Some(TrackerPlatform::Trello));
        assert!(connection.api_key.is_empty());
        assert!(connection.token.is_empty());
        assert!(!connection.connected);
        assert!(connection.data.is_none());
    }

    #[test]
    fn test_generation_lifecycle() {
        let mut store = Store::default();
        store.dispatch(Action::GenerationError("old failure".into()));
        assert_eq!(store.state().error.as_deref(), Some("old failure"));

        store.dispatch(Action::StartGeneration);
        assert!(store.state().is_generating);
        assert!(store.state().error.is_none());

        let generated = report("## Report");
        store.dispatch(Action::GenerationSuccess(generated.clone()));
        assert!(!store.state().is_generating);
        assert_eq!(store.state().generated_reports.len(), 1);
        assert_eq!(
            store.state().current_report.as_ref().map(|r| r.id.as_str()),
            Some(generated.id.as_str())
        );
    }

    #[test]
    fn test_generation_error_keeps_prior_report() {
        let mut store = Store::default();
        let generated = report("first");
        store.dispatch(Action::GenerationSuccess(generated.clone()));

        store.dispatch(Action::StartGeneration);
        store.dispatch(Action::GenerationError("remote unavailable".into()));

        assert!(!store.state().is_generating);
        assert_eq!(store.state().error.as_deref(), Some("remote unavailable"));
        assert_eq!(
            store.state().current_report.as_ref().map(|r| r.id.as_str()),
            Some(generated.id.as_str())
        );
    }

    #[test]
    fn test_update_report_content_mirrors_into_history() {
        let mut store = Store::default();
        let generated = report("draft body");
        let id = generated.id.clone();
        store.dispatch(Action::GenerationSuccess(generated));

        store.dispatch(Action::UpdateReportContent {
            report_id: id.clone(),
            content: "edited body".into(),
        });

        assert_eq!(
            store.state().current_report.as_ref().unwrap().content,
            "edited body"
        );
        assert_eq!(store.state().generated_reports[0].content, "edited body");
        assert!(matches!(
            store.state().generated_reports[0].status,
            ReportStatus::Draft
        ));
    }

    #[test]
    fn test_update_report_content_stale_id_is_noop() {
        let mut store = Store::default();
        store.dispatch(Action::GenerationSuccess(report("body")));

        store.dispatch(Action::UpdateReportContent {
            report_id: "not-the-current-id".into(),
            content: "should not apply".into(),
        });

        assert_eq!(store.state().current_report.as_ref().unwrap().content, "body");
        assert_eq!(store.state().generated_reports[0].content, "body");
    }

    #[test]
    fn test_connect_api_success_upserts_wholesale() {
        let mut store = Store::default();
        store.dispatch(Action::SetPlatform(Some(TrackerPlatform::Jira)));

        let data: TrackerData = serde_json::from_str(
            r#"{"user": {"id": "u1"}, "projects": [], "issues": []}"#,
        )
        .unwrap();
        store.dispatch(Action::ConnectApiSuccess(data));

        let connection = &store.state().user_input.connection;
        assert!(connection.connected);
        assert!(matches!(connection.data, Some(TrackerData::Issue(_))));
    }

    #[test]
    fn test_tab_wire_names() {
        assert_eq!(serde_json::to_value(Tab::Daily).unwrap(), "daily");
        assert_eq!(serde_json::to_value(Tab::Tracker).unwrap(), "api");
        assert_eq!(serde_json::to_value(Tab::File).unwrap(), "file");
    }
}
