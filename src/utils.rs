//! Date helpers for prescription display and expiry checks.
//!
//! Prescription dates travel as `YYYY-MM-DD` strings. Display goes through
//! [`format_date`], comparisons go through [`date_for_comparison`]. Neither
//! function panics on malformed input.

use time::{Date, Month, OffsetDateTime};

/// Whether a prescription is still within its validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The expiry date is today or later.
    Valid,
    /// The expiry date is strictly before today.
    Expired,
    /// The expiry date could not be parsed.
    Unknown,
}

/// Formats `YYYY-MM-DD` as `DD MM YYYY`.
///
/// Input that does not split into exactly three dash-separated parts is
/// returned unchanged, so the result is always displayable.
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return String::new();
    }

    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [year, month, day] => format!("{day} {month} {year}"),
        _ => date.to_string(),
    }
}

/// Parses a `YYYY-MM-DD` string into a calendar date.
///
/// Month and day may omit their zero padding (`2024-1-5`). Returns `None`
/// when the string is not a valid calendar date.
pub fn date_for_comparison(date: &str) -> Option<Date> {
    let mut parts = date.trim().split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

/// Today's date in the local timezone, falling back to UTC when the local
/// offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Classifies an expiry date string relative to `today`.
pub fn expiry_status(expiry_date: &str, today: Date) -> Expiry {
    match date_for_comparison(expiry_date) {
        Some(expiry) if expiry < today => Expiry::Expired,
        Some(_) => Expiry::Valid,
        None => {
            tracing::debug!(expiry_date, "Unparseable expiry date");
            Expiry::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn formats_iso_date_for_display() {
        assert_eq!(format_date("2023-05-10"), "10 05 2023");
    }

    #[test]
    fn empty_date_formats_to_empty() {
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn malformed_date_is_returned_unchanged() {
        assert_eq!(format_date("invalid-date"), "invalid-date");
        assert_eq!(format_date("2023/05/10"), "2023/05/10");
        assert_eq!(format_date("2023-05-10-01"), "2023-05-10-01");
    }

    #[test]
    fn parses_date_for_comparison() {
        assert_eq!(date_for_comparison("2023-05-10"), Some(date!(2023 - 05 - 10)));
    }

    #[test]
    fn parses_unpadded_month_and_day() {
        assert_eq!(date_for_comparison("2024-1-5"), Some(date!(2024 - 01 - 05)));
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(date_for_comparison(""), None);
        assert_eq!(date_for_comparison("invalid-date"), None);
        assert_eq!(date_for_comparison("2023-13-01"), None);
        assert_eq!(date_for_comparison("2023-02-30"), None);
        assert_eq!(date_for_comparison("2023-05-10-01"), None);
    }

    #[test]
    fn expiry_is_strictly_before_today() {
        let today = date!(2025 - 06 - 15);
        assert_eq!(expiry_status("2025-06-14", today), Expiry::Expired);
        assert_eq!(expiry_status("2025-06-15", today), Expiry::Valid);
        assert_eq!(expiry_status("2099-01-01", today), Expiry::Valid);
        assert_eq!(expiry_status("soon", today), Expiry::Unknown);
    }
}
