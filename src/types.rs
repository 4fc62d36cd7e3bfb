//! Core data model: daily records, tracker graphs, import results, and the
//! normalized input consumed by report synthesis.
//!
//! All serialized shapes use camelCase to stay wire-compatible with the
//! JSON the web front end and persistence endpoints already exchange.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// =============================================================================
// Daily records
// =============================================================================

/// One free-text work log entry, keyed by date (one entry per date,
/// last write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRecordEntry {
    /// ISO `YYYY-MM-DD`. Lexicographic order equals chronological order.
    pub date: String,
    pub content: String,
}

impl DailyRecordEntry {
    pub fn new(date: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            content: content.into(),
        }
    }
}

// =============================================================================
// Tracker graph (raw fetch output, resolved per platform at the adapter)
// =============================================================================

/// The authenticated tracker user, normalized across platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerIdentity {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// Issue-style work item (Jira).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerIssue {
    pub id: String,
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default)]
    pub project_name: String,
    pub assigned_to_caller: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerProject {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub issues: Vec<TrackerIssue>,
}

/// Full issue-style graph. Invariant: every issue in a project's `issues`
/// also appears in the flat `issues` list (no orphans).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTrackerData {
    pub user: TrackerIdentity,
    pub projects: Vec<TrackerProject>,
    pub issues: Vec<TrackerIssue>,
}

/// Board-style work item (Trello card).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub list_name: String,
    pub assigned_to_caller: bool,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<TrackerCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerBoard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub lists: Vec<TrackerList>,
}

/// Full board-style graph. Same dual-membership invariant: every card in a
/// list's `cards` also appears in the flat `cards` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTrackerData {
    pub user: TrackerIdentity,
    pub boards: Vec<TrackerBoard>,
    pub cards: Vec<TrackerCard>,
}

/// Raw fetched tracker graph. Untagged: the two shapes are disjoint
/// (`projects`/`issues` vs `boards`/`cards`), matching the union the
/// front end stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackerData {
    Issue(IssueTrackerData),
    Board(BoardTrackerData),
}

impl From<IssueTrackerData> for TrackerData {
    fn from(data: IssueTrackerData) -> Self {
        TrackerData::Issue(data)
    }
}

impl From<BoardTrackerData> for TrackerData {
    fn from(data: BoardTrackerData) -> Self {
        TrackerData::Board(data)
    }
}

// =============================================================================
// Spreadsheet import
// =============================================================================

/// Row objects are JSON maps keyed by `headers[i]` positionally; missing
/// cells are explicit nulls, excess cells are dropped.
pub type ImportRow = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Data rows in the first sheet (headers excluded).
    pub total_rows: usize,
    pub total_sheets: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileImportResult {
    pub file_name: String,
    pub file_type: String,
    pub sheets: Vec<SheetMeta>,
    pub main_data: Vec<ImportRow>,
    pub headers: Vec<String>,
    pub summary: ImportSummary,
}

// =============================================================================
// Normalized input (built fresh per generation request)
// =============================================================================

/// Presence flags for the three evidence sources, derived strictly from
/// whether each produced non-empty content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    pub has_daily_records: bool,
    pub has_tracker_data: bool,
    pub has_file_data: bool,
}

/// Processed tracker summary, tagged by platform style. Counts are always
/// recomputed from the concrete list lengths, never carried over stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProcessedTrackerData {
    #[serde(rename_all = "camelCase")]
    BoardStyle {
        cards: Vec<TrackerCard>,
        boards: Vec<TrackerBoard>,
        status: BoardTrackerStats,
    },
    #[serde(rename_all = "camelCase")]
    IssueStyle {
        issues: Vec<TrackerIssue>,
        projects: Vec<TrackerProject>,
        stats: IssueTrackerStats,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTrackerStats {
    pub total_cards: usize,
    pub completed_cards: usize,
    pub total_boards: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTrackerStats {
    pub total_issues: usize,
    pub completed_issues: usize,
    pub total_projects: usize,
}

/// The unified, source-agnostic object consumed by report synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInput {
    /// Sorted by date descending.
    pub daily_records: Vec<DailyRecordEntry>,
    pub tracker_summary: Option<ProcessedTrackerData>,
    pub file_data: Option<FileImportResult>,
    pub data_sources: DataSources,
}

// =============================================================================
// Generated reports
// =============================================================================

/// Which evidence sources fed a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSource {
    pub daily_record: bool,
    pub tracker_platform: Option<String>,
    pub file_uploaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Final,
}

/// A generated review draft. Created once per generation; content is
/// editable afterward under the same id; appended to history, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub id: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub content: String,
    pub source: ReportSource,
    pub status: ReportStatus,
}

impl GeneratedReport {
    pub fn new(content: String, source: ReportSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            content,
            source,
            status: ReportStatus::Draft,
        }
    }
}
