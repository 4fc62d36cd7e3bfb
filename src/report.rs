//! Report synthesizer.
//!
//! The deterministic renderer that folds a `NormalizedInput` into markdown.
//! The remote generation path promises the identical section contract, so
//! this module doubles as the fallback implementation and the oracle its
//! tests check against.

use crate::types::{
    DailyRecordEntry, NormalizedInput, ProcessedTrackerData, TrackerCard, TrackerIssue,
};
use crate::util::truncate_chars;

/// Status strings per bucket. Anything outside all three buckets is
/// excluded from the listings but still counted in the totals.
pub const COMPLETED_STATUSES: [&str; 3] = ["Done", "Closed", "Resolved"];
pub const IN_PROGRESS_STATUSES: [&str; 2] = ["In Progress", "In Review"];
pub const PENDING_STATUSES: [&str; 3] = ["To Do", "Open", "New"];

/// Rate used by the performance evaluation when no tracker items are
/// available to derive one from.
pub const DEFAULT_COMPLETION_RATE: u32 = 95;

const DESCRIPTION_LIMIT: usize = 100;
const NO_DESCRIPTION: &str = "No description";

/// Render the full report. Sections appear in a fixed order; the heading,
/// performance evaluation, and future goals are always present, the
/// source-specific sections only when their source produced content.
pub fn synthesize(input: &NormalizedInput) -> String {
    let mut report = String::with_capacity(2048);
    report.push_str("## Self-Assessment Report\n\n");

    if !input.daily_records.is_empty() {
        report.push_str("### Daily Work Summary\n");
        report.push_str(&daily_record_summary(&input.daily_records));
        report.push_str("\n\n");
    }

    if let Some(summary) = &input.tracker_summary {
        match summary {
            ProcessedTrackerData::IssueStyle { issues, .. } => {
                report.push_str(&issue_work_summary(issues));
            }
            ProcessedTrackerData::BoardStyle { cards, .. } => {
                report.push_str(&board_work_summary(cards));
            }
        }
        report.push_str("\n\n");
    }

    if input.file_data.is_some() {
        report.push_str("### File Data Analysis\n");
        report.push_str("No file data analysis available yet.\n\n");
    }

    report.push_str(&performance_evaluation(input));

    report.push_str("### Future Goals\n");
    report.push_str("- Continue optimizing existing systems\n");
    report.push_str("- Learn new technical frameworks\n");
    report.push_str("- Improve team communication efficiency\n");

    report
}

/// `- Record N: <content>` per entry, in input order. The "more entries"
/// note past three records is informational only; every record above it
/// stays listed.
fn daily_record_summary(records: &[DailyRecordEntry]) -> String {
    let mut summary = String::new();
    for (index, record) in records.iter().enumerate() {
        summary.push_str(&format!("- Record {}: {}\n", index + 1, record.content));
    }
    if records.len() > 3 {
        summary.push_str(&format!("- ...and {} more entries\n", records.len() - 3));
    }
    summary
}

fn issue_work_summary(issues: &[TrackerIssue]) -> String {
    let assigned: Vec<&TrackerIssue> = issues.iter().filter(|i| i.assigned_to_caller).collect();
    let completed = bucket(&assigned, &COMPLETED_STATUSES);
    let in_progress = bucket(&assigned, &IN_PROGRESS_STATUSES);
    let pending = bucket(&assigned, &PENDING_STATUSES);

    let mut summary = String::with_capacity(1024);
    summary.push_str("### Jira Work Summary\n\n");

    summary.push_str("#### Completed\n");
    push_issue_entries(&mut summary, &completed, "- No completed work items\n");

    summary.push_str("\n#### In Progress\n");
    push_issue_entries(&mut summary, &in_progress, "- No in-progress work items\n");

    summary.push_str("\n#### Pending\n");
    push_issue_entries(&mut summary, &pending, "- No pending work items\n");

    summary.push_str("\n#### Work Statistics\n");
    summary.push_str(&format!("- Total assigned issues: {}\n", assigned.len()));
    summary.push_str(&format!("- Completed issues: {}\n", completed.len()));
    summary.push_str(&format!(
        "- Completion rate: {}%\n",
        completion_rate(completed.len(), assigned.len())
    ));
    summary
}

fn board_work_summary(cards: &[TrackerCard]) -> String {
    let assigned: Vec<&TrackerCard> = cards.iter().filter(|c| c.assigned_to_caller).collect();
    let completed: Vec<&TrackerCard> = assigned.iter().copied().filter(|c| c.completed).collect();
    let in_progress: Vec<&TrackerCard> =
        assigned.iter().copied().filter(|c| !c.completed).collect();

    let mut summary = String::with_capacity(1024);
    summary.push_str("### Trello Work Summary\n\n");

    summary.push_str("#### Completed\n");
    push_card_entries(&mut summary, &completed, "- No completed work items\n");

    summary.push_str("\n#### In Progress\n");
    push_card_entries(&mut summary, &in_progress, "- No in-progress work items\n");

    summary.push_str("\n#### Work Statistics\n");
    summary.push_str(&format!("- Total assigned cards: {}\n", assigned.len()));
    summary.push_str(&format!("- Completed cards: {}\n", completed.len()));
    summary.push_str(&format!(
        "- Completion rate: {}%\n",
        completion_rate(completed.len(), assigned.len())
    ));
    summary
}

fn bucket<'a>(assigned: &[&'a TrackerIssue], statuses: &[&str]) -> Vec<&'a TrackerIssue> {
    assigned
        .iter()
        .copied()
        .filter(|issue| statuses.contains(&issue.status.as_str()))
        .collect()
}

fn push_issue_entries(out: &mut String, issues: &[&TrackerIssue], empty_line: &str) {
    if issues.is_empty() {
        out.push_str(empty_line);
        return;
    }
    for issue in issues {
        out.push_str(&format!(
            "- **{}: {}**: {}\n",
            issue.key,
            issue.title,
            describe(&issue.description)
        ));
    }
}

fn push_card_entries(out: &mut String, cards: &[&TrackerCard], empty_line: &str) {
    if cards.is_empty() {
        out.push_str(empty_line);
        return;
    }
    for card in cards {
        out.push_str(&format!("- **{}**: {}\n", card.name, describe(&card.description)));
    }
}

fn describe(description: &str) -> String {
    if description.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        truncate_chars(description, DESCRIPTION_LIMIT)
    }
}

/// Rounded percentage; 0 when there is nothing assigned.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    }
}

/// Completion rate for the evaluation section: derived from assigned tracker
/// items when there are any, else the fixed default. A connected tracker
/// with zero assigned items keeps the default rather than scoring 0.
fn evaluation_rate(input: &NormalizedInput) -> u32 {
    match &input.tracker_summary {
        Some(ProcessedTrackerData::IssueStyle { issues, .. }) => {
            let assigned: Vec<&TrackerIssue> =
                issues.iter().filter(|i| i.assigned_to_caller).collect();
            if assigned.is_empty() {
                DEFAULT_COMPLETION_RATE
            } else {
                completion_rate(bucket(&assigned, &COMPLETED_STATUSES).len(), assigned.len())
            }
        }
        Some(ProcessedTrackerData::BoardStyle { cards, .. }) => {
            let assigned: Vec<&TrackerCard> =
                cards.iter().filter(|c| c.assigned_to_caller).collect();
            if assigned.is_empty() {
                DEFAULT_COMPLETION_RATE
            } else {
                completion_rate(assigned.iter().filter(|c| c.completed).count(), assigned.len())
            }
        }
        None => DEFAULT_COMPLETION_RATE,
    }
}

fn ratings(rate: u32) -> (&'static str, &'static str) {
    if rate < 70 {
        ("Needs improvement", "Average")
    } else if rate < 85 {
        ("Good", "Good")
    } else {
        ("Excellent", "Excellent")
    }
}

fn performance_evaluation(input: &NormalizedInput) -> String {
    let rate = evaluation_rate(input);
    let (quality, collaboration) = ratings(rate);

    let mut evaluation = String::new();
    evaluation.push_str("### Performance Evaluation\n");
    evaluation.push_str(&format!("Task completion rate: {}%\n", rate));
    evaluation.push_str(&format!("Work quality: {}\n", quality));
    evaluation.push_str(&format!("Collaboration: {}\n\n", collaboration));
    evaluation
}
