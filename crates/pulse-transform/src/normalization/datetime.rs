//! Date parsing and formatting for vendor values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a report date: compact `YYYYMMDD` as sent by analytics APIs, or
/// the already-normalized `YYYY-MM-DD`.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(trimmed, "%Y%m%d").ok();
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Parses a vendor timestamp such as `2024-03-01T10:00:00+00:00` or
/// `2024-03-01T10:00:00Z`. The offset is discarded; values are taken as
/// reported.
pub fn parse_vendor_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.naive_local());
    }
    let local = trimmed.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}

/// Day-first display used by the email campaign tables.
pub fn format_day_month_year(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_report_date() {
        assert_eq!(parse_report_date("20240105"), Some(date(2024, 1, 5)));
        assert_eq!(parse_report_date("2024-01-05"), Some(date(2024, 1, 5)));
        assert_eq!(parse_report_date("20241305"), None);
        assert_eq!(parse_report_date("(other)"), None);
    }

    #[test]
    fn test_parse_vendor_timestamp() {
        let expected = date(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(parse_vendor_timestamp("2024-03-01T10:00:00+00:00"), Some(expected));
        assert_eq!(parse_vendor_timestamp("2024-03-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_vendor_timestamp("2024-03-01T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_vendor_timestamp("2024-03-01T10:00:00-05:00"), Some(expected));
        assert_eq!(parse_vendor_timestamp("2024-03-01T10:00:00"), Some(expected));
        assert_eq!(parse_vendor_timestamp("yesterday"), None);
    }

    #[test]
    fn test_month_and_display() {
        assert_eq!(parse_month("2024-02"), Some(date(2024, 2, 1)));
        assert_eq!(parse_month("Feb"), None);
        assert_eq!(format_day_month_year(date(2024, 2, 9)), "09-02-2024");
    }
}
