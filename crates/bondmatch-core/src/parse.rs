//! Cell-level parsing shared by the report, master and ledger readers
//!
//! Every function here is total: a value that cannot be parsed comes back as
//! `None` so the row still reaches classification.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ByteRecord, StringRecord};
use rust_decimal::Decimal;

/// Decode a raw CSV record, replacing invalid UTF-8 with U+FFFD
///
/// Spreadsheet exports are often Latin-1; a stray byte must cost one
/// character, not the run.
pub fn decode_record(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Day-first date-time layouts, tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Day-first date layouts, tried in order
///
/// Two-digit years come first: `%Y` would otherwise read `24` as year 24.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", // 15/01/24
    "%d-%m-%y", // 15-01-24
    "%d-%b-%y", // 15-Jan-24
    "%d/%m/%Y", // 15/01/2024
    "%d-%m-%Y", // 15-01-2024
    "%d.%m.%Y", // 15.01.2024
    "%d-%b-%Y", // 15-Jan-2024
    "%d %b %Y", // 15 Jan 2024
    "%Y-%m-%d", // 2024-01-15
    "%Y/%m/%d", // 2024/01/15
];

/// Trim a raw cell
pub fn normalize_cell(raw: &str) -> String {
    raw.trim().to_string()
}

/// Trim and uppercase a raw cell
pub fn upper_cell(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Uppercase and drop every whitespace character
pub fn compact_upper(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Keep only ASCII digits
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Last 16 digits of a value, if it carries at least 16
pub fn last_16_digits(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() >= 16 {
        Some(digits[digits.len() - 16..].to_string())
    } else {
        None
    }
}

/// Parse a day-first date, with or without a time of day
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parse a unit count, ignoring thousands separators
///
/// The result is normalized so numerically equal inputs are equal and hash
/// the same (`100`, `100.00`, `1,00`).
pub fn parse_quantity(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.replace(',', "").trim().to_string();
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
        .map(|d| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_date_day_first() {
        assert_eq!(parse_date("10/01/2024"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("10-Jan-2024"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10"), Some(ymd(2024, 1, 10)));
        assert_eq!(parse_date(" 10.01.2024 "), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_parse_date_with_time() {
        let dt = parse_date("2024-01-10 15:30:00").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(dt.format("%H:%M").to_string(), "15:30");
    }

    #[test]
    fn test_parse_date_invalid() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("31/02/2024"), None);
    }

    #[test]
    fn test_parse_quantity_numeric_equality() {
        assert_eq!(parse_quantity("100"), parse_quantity("100.00"));
        assert_eq!(parse_quantity("1,000"), parse_quantity("1000"));
        assert_ne!(parse_quantity("100"), parse_quantity("1,000"));
        assert_eq!(parse_quantity("1e3"), parse_quantity("1000"));
        assert_eq!(parse_quantity("abc"), None);
        assert_eq!(parse_quantity("  "), None);
    }

    #[test]
    fn test_parse_quantity_normalized_display() {
        assert_eq!(parse_quantity("500.00").unwrap().to_string(), "500");
        assert_eq!(parse_quantity("12.50").unwrap().to_string(), "12.5");
    }

    #[test]
    fn test_last_16_digits() {
        assert_eq!(
            last_16_digits("A/C 12 3456 7890 1234 5678"),
            Some("3456789012345678".to_string())
        );
        assert_eq!(last_16_digits("12345"), None);
    }

    #[test]
    fn test_compact_upper() {
        assert_eq!(compact_upper(" in 3012\t34ab "), "IN301234AB");
    }

    #[test]
    fn test_decode_record_lossy() {
        let record = ByteRecord::from(vec![&b"REN\xC9"[..], &b"500"[..]]);
        let decoded = decode_record(&record);
        assert_eq!(decoded.get(0), Some("REN\u{FFFD}"));
        assert_eq!(decoded.get(1), Some("500"));
    }
}
