//! Spreadsheet importer.
//!
//! Parses an uploaded tabular file into `FileImportResult`: the first sheet
//! becomes the main data (first row = headers, remaining rows zipped
//! positionally into row objects), and every sheet contributes row/column
//! metadata. Excel-family formats go through calamine; CSV gets a single
//! synthetic sheet named after the file stem.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{FileImportResult, ImportRow, ImportSummary, SheetMeta};

/// Parse a file by extension. Unknown extensions are a validation error;
/// unreadable content or an empty first sheet is a parse error.
pub fn parse_file(path: &Path) -> Result<FileImportResult> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let result = match ext.as_str() {
        "xlsx" | "xls" | "xlsm" | "ods" => parse_workbook(path, &ext)?,
        "csv" => parse_csv(path)?,
        _ => {
            return Err(Error::Validation(
                "please upload an Excel or CSV file (.xlsx, .xls, .xlsm, .ods, .csv)".to_string(),
            ))
        }
    };

    log::info!(
        "Imported '{}': {} data rows across {} sheets",
        result.file_name,
        result.summary.total_rows,
        result.summary.total_sheets
    );
    Ok(result)
}

fn parse_workbook(path: &Path, file_type: &str) -> Result<FileImportResult> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Parse(format!("could not open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(Error::Parse("workbook has no sheets".to_string()));
    }

    let mut sheets = Vec::new();
    let mut main_rows: Vec<Vec<Value>> = Vec::new();

    for (idx, name) in sheet_names.iter().enumerate() {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| Error::Parse(format!("sheet '{}': {}", name, e)))?;
        sheets.push(SheetMeta {
            name: name.clone(),
            row_count: range.height(),
            column_count: range.width(),
        });
        if idx == 0 {
            main_rows = range
                .rows()
                .map(|row| row.iter().map(cell_to_value).collect())
                .collect();
        }
    }

    build_import_result(file_name_of(path), file_type.to_string(), main_rows, sheets)
}

fn parse_csv(path: &Path) -> Result<FileImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::Parse(format!("could not open CSV: {}", e)))?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Parse(format!("malformed CSV: {}", e)))?;
        rows.push(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::String(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string();
    let sheets = vec![SheetMeta {
        name: stem,
        row_count: rows.len(),
        column_count: rows.iter().map(|r| r.len()).max().unwrap_or(0),
    }];

    build_import_result(file_name_of(path), "csv".to_string(), rows, sheets)
}

/// Assemble the result from raw cell rows: first row is always headers,
/// the rest zip positionally. Fails when there are no rows at all;
/// a headers-only sheet yields empty main data.
fn build_import_result(
    file_name: String,
    file_type: String,
    rows: Vec<Vec<Value>>,
    sheets: Vec<SheetMeta>,
) -> Result<FileImportResult> {
    if rows.is_empty() {
        return Err(Error::Parse("the first sheet has no rows".to_string()));
    }

    let headers: Vec<String> = rows[0].iter().map(header_name).collect();
    let main_data: Vec<ImportRow> = rows[1..].iter().map(|row| zip_row(&headers, row)).collect();
    let summary = ImportSummary {
        total_rows: main_data.len(),
        total_sheets: sheets.len(),
    };

    Ok(FileImportResult {
        file_name,
        file_type,
        sheets,
        main_data,
        headers,
        summary,
    })
}

/// Zip one data row against the headers. Missing cells become explicit
/// nulls; cells beyond the header count are dropped.
fn zip_row(headers: &[String], cells: &[Value]) -> ImportRow {
    let mut row = ImportRow::new();
    for (i, header) in headers.iter().enumerate() {
        row.insert(header.clone(), cells.get(i).cloned().unwrap_or(Value::Null));
    }
    row
}

fn header_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(n) => Value::from(*n),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(e) => Value::String(format!("#ERR({:?})", e)),
        Data::DateTime(dt) => Value::String(format!("{}", dt)),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sheet(name: &str, rows: usize, cols: usize) -> SheetMeta {
        SheetMeta {
            name: name.to_string(),
            row_count: rows,
            column_count: cols,
        }
    }

    #[test]
    fn test_rows_zip_positionally_against_headers() {
        let rows = vec![
            vec![Value::String("Date".into()), Value::String("Task".into())],
            vec![Value::String("2025-01-02".into()), Value::String("importer".into())],
        ];
        let result =
            build_import_result("log.xlsx".into(), "xlsx".into(), rows, vec![sheet("S1", 2, 2)])
                .unwrap();

        assert_eq!(result.headers, vec!["Date", "Task"]);
        assert_eq!(result.main_data.len(), 1);
        assert_eq!(
            result.main_data[0].get("Task"),
            Some(&Value::String("importer".into()))
        );
        assert_eq!(result.summary.total_rows, 1);
    }

    #[test]
    fn test_short_rows_pad_with_null_long_rows_drop_excess() {
        let rows = vec![
            vec![Value::String("A".into()), Value::String("B".into())],
            vec![Value::String("only-a".into())],
            vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("dropped".into()),
            ],
        ];
        let result =
            build_import_result("f.xlsx".into(), "xlsx".into(), rows, vec![sheet("S1", 3, 3)])
                .unwrap();

        assert_eq!(result.main_data[0].get("B"), Some(&Value::Null));
        assert_eq!(result.main_data[1].len(), 2);
        assert!(!result.main_data[1].values().any(|v| v == "dropped"));
    }

    #[test]
    fn test_zero_rows_is_parse_error() {
        let err = build_import_result("f.xlsx".into(), "xlsx".into(), vec![], vec![]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_headers_only_sheet_yields_empty_main_data() {
        let rows = vec![vec![Value::String("A".into())]];
        let result =
            build_import_result("f.xlsx".into(), "xlsx".into(), rows, vec![sheet("S1", 1, 1)])
                .unwrap();
        assert!(result.main_data.is_empty());
        assert_eq!(result.summary.total_rows, 0);
        assert_eq!(result.headers, vec!["A"]);
    }

    #[test]
    fn test_duplicate_headers_last_cell_wins() {
        let rows = vec![
            vec![Value::String("X".into()), Value::String("X".into())],
            vec![Value::String("first".into()), Value::String("second".into())],
        ];
        let result =
            build_import_result("f.xlsx".into(), "xlsx".into(), rows, vec![sheet("S1", 2, 2)])
                .unwrap();
        assert_eq!(
            result.main_data[0].get("X"),
            Some(&Value::String("second".into()))
        );
    }

    #[test]
    fn test_unknown_extension_is_validation_error() {
        let err = parse_file(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_parse_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worklog.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Date,Task,Hours").unwrap();
        writeln!(file, "2025-01-02,importer,3").unwrap();
        writeln!(file, "2025-01-03,adapter,").unwrap();
        drop(file);

        let result = parse_file(&path).unwrap();
        assert_eq!(result.file_type, "csv");
        assert_eq!(result.file_name, "worklog.csv");
        assert_eq!(result.headers, vec!["Date", "Task", "Hours"]);
        assert_eq!(result.summary.total_rows, 2);
        assert_eq!(result.summary.total_sheets, 1);
        assert_eq!(result.sheets[0].name, "worklog");
        // Empty trailing cell is an explicit null.
        assert_eq!(result.main_data[1].get("Hours"), Some(&Value::Null));
    }

    #[test]
    fn test_parse_csv_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "OnlyHeader\n").unwrap();

        let result = parse_file(&path).unwrap();
        assert!(result.main_data.is_empty());
        assert_eq!(result.summary.total_rows, 0);
    }

    #[test]
    fn test_parse_csv_fully_empty_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.csv");
        std::fs::write(&path, "").unwrap();

        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_cell_to_value_types() {
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(cell_to_value(&Data::Int(3)), Value::from(3));
        assert_eq!(cell_to_value(&Data::Float(2.5)), Value::from(2.5));
        assert_eq!(cell_to_value(&Data::Bool(true)), Value::Bool(true));
        assert_eq!(
            cell_to_value(&Data::String("x".into())),
            Value::String("x".into())
        );
    }
}
