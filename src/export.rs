//! Report export.
//!
//! Writes the current report content to a date-stamped markdown file,
//! `report_<ISO-date>.md`, stamped with today's date rather than the
//! report's creation time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

use crate::error::Result;
use crate::types::GeneratedReport;

pub fn export_filename(date: NaiveDate) -> String {
    format!("report_{}.md", date.format("%Y-%m-%d"))
}

/// Write `report`'s content into `dir` (created if missing) and return the
/// full path of the exported file.
pub fn export_report(report: &GeneratedReport, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(Utc::now().date_naive()));
    fs::write(&path, &report.content)?;
    log::info!("Exported report {} to {}", report.id, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportSource;

    fn report() -> GeneratedReport {
        GeneratedReport::new(
            "## Self-Assessment Report\n\nbody\n".to_string(),
            ReportSource {
                daily_record: true,
                tracker_platform: None,
                file_uploaded: false,
            },
        )
    }

    #[test]
    fn test_export_filename_pattern() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(export_filename(date), "report_2025-03-07.md");
    }

    #[test]
    fn test_export_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_report(&report(), dir.path()).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("report_") && name.ends_with(".md"));

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "## Self-Assessment Report\n\nbody\n");
    }

    #[test]
    fn test_export_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("reports");
        let path = export_report(&report(), &nested).unwrap();
        assert!(path.exists());
    }
}
