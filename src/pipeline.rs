//! Aggregation pipeline.
//!
//! Pure functions that fold the three evidence sources (daily records,
//! tracker graph, file import) into one `NormalizedInput` per generation
//! request. No I/O here: everything reads a state snapshot and returns a
//! fresh value.

use crate::state::AppState;
use crate::types::{
    BoardTrackerStats, DailyRecordEntry, DataSources, IssueTrackerStats, NormalizedInput,
    ProcessedTrackerData, TrackerData,
};

/// Statuses the issue-style completion stat counts. The report's completed
/// bucket additionally treats "Resolved" as done; the stat does not.
const STAT_COMPLETED_STATUSES: [&str; 2] = ["Done", "Closed"];

/// Whether the snapshot holds anything a report could be built from.
/// Generation is blocked while this is false.
pub fn has_data_to_generate(state: &AppState) -> bool {
    let user = &state.user_input;
    let has_daily = !user.daily_records.is_empty();
    let has_tracker = user.connection.connected && user.connection.data.is_some();
    let has_file =
        user.file_upload.uploaded && user.file_upload.parsed && user.file_upload.data.is_some();
    has_daily || has_tracker || has_file
}

/// Build the `NormalizedInput` for one generation request.
pub fn aggregate(state: &AppState) -> NormalizedInput {
    let user = &state.user_input;
    let mut daily_records: Vec<DailyRecordEntry> = user
        .daily_records
        .iter()
        .map(|(date, content)| DailyRecordEntry::new(date.clone(), content.clone()))
        .collect();
    // ISO dates compare lexicographically; newest first without parsing.
    daily_records.sort_by(|a, b| b.date.cmp(&a.date));

    // A selected platform with no fetched data yet is simply no tracker
    // summary, never an error.
    let tracker_summary = match (&user.connection.platform, &user.connection.data) {
        (Some(_), Some(data)) => Some(process_tracker_data(data)),
        _ => None,
    };

    // File-import state passes through as the importer produced it.
    let file_data = user.file_upload.data.clone();

    let data_sources = DataSources {
        has_daily_records: !daily_records.is_empty(),
        has_tracker_data: tracker_summary.is_some(),
        has_file_data: file_data.is_some(),
    };

    NormalizedInput {
        daily_records,
        tracker_summary,
        file_data,
        data_sources,
    }
}

/// Classify a raw tracker graph into its tagged summary variant. All counts
/// are recomputed from the concrete list lengths; counts embedded in the
/// fetched payload are never trusted.
pub fn process_tracker_data(data: &TrackerData) -> ProcessedTrackerData {
    match data {
        TrackerData::Issue(issue_data) => {
            let stats = IssueTrackerStats {
                total_issues: issue_data.issues.len(),
                completed_issues: issue_data
                    .issues
                    .iter()
                    .filter(|i| STAT_COMPLETED_STATUSES.contains(&i.status.as_str()))
                    .count(),
                total_projects: issue_data.projects.len(),
            };
            ProcessedTrackerData::IssueStyle {
                issues: issue_data.issues.clone(),
                projects: issue_data.projects.clone(),
                stats,
            }
        }
        TrackerData::Board(board_data) => {
            let status = BoardTrackerStats {
                total_cards: board_data.cards.len(),
                completed_cards: board_data.cards.iter().filter(|c| c.completed).count(),
                total_boards: board_data.boards.len(),
            };
            ProcessedTrackerData::BoardStyle {
                cards: board_data.cards.clone(),
                boards: board_data.boards.clone(),
                status,
            }
        }
    }
}
