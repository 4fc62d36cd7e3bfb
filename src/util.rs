use chrono::NaiveDate;

/// Truncate to `max_chars` characters, appending an ellipsis when the input
/// was longer. Counts chars, not bytes, so multi-byte text never splits.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}...", truncated)
}

/// Validate an ISO `YYYY-MM-DD` date string (zero-padded, calendar-valid).
pub fn is_valid_date(date: &str) -> bool {
    date.len() == 10 && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

/// Validate a `YYYY-MM` year-month string.
pub fn is_valid_year_month(year_month: &str) -> bool {
    if year_month.len() != 7 {
        return false;
    }
    let padded = format!("{}-01", year_month);
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d").is_ok()
}
