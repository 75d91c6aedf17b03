//! Date parsing helpers.
//!
//! - [`convert_format_date`] - free-form cell text to an ISO calendar date
//! - [`parsed_on_from_file_name`] - reporting period from a `YYYY.MM...` file name

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::FilenameDateError;

/// Output format of every converted date.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-format patterns requiring a 4-digit `%Y`, built on first use.
static YEAR_GUARDS: Lazy<Mutex<HashMap<String, Option<Regex>>>> = Lazy::new(Default::default);

/// Try each format in order and return the first match as `YYYY-MM-DD`.
///
/// Formats containing a time component are parsed as date-times and the
/// time is discarded. The whole input must match the format.
pub fn convert_format_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<String> {
    formats
        .iter()
        .find_map(|format| parse_date(value, format.as_ref()))
        .map(|date| date.format(ISO_DATE_FORMAT).to_string())
}

fn parse_date(value: &str, format: &str) -> Option<NaiveDate> {
    if !has_full_year(value, format) {
        return None;
    }
    if has_time(format) {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|dt| dt.date())
    } else {
        NaiveDate::parse_from_str(value, format).ok()
    }
}

fn has_time(format: &str) -> bool {
    ["%H", "%M", "%S", "%T", "%R"]
        .iter()
        .any(|spec| format.contains(spec))
}

/// chrono reads `%Y` from 1 to 4 digits; a year must be written in full.
fn has_full_year(value: &str, format: &str) -> bool {
    let mut guards = YEAR_GUARDS.lock().unwrap_or_else(PoisonError::into_inner);
    if !guards.contains_key(format) {
        guards.insert(format.to_string(), year_guard(format));
    }
    guards
        .get(format)
        .and_then(Option::as_ref)
        .map_or(true, |re| re.is_match(value))
}

/// Anchored pattern for `format` with `%Y` as exactly 4 digits, or `None`
/// if the format has no `%Y`.
fn year_guard(format: &str) -> Option<Regex> {
    if !format.contains("%Y") {
        return None;
    }

    let mut pattern = String::from("^");
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
            continue;
        }
        match chars.next() {
            Some('Y') => pattern.push_str(r"\d{4}"),
            Some('d' | 'm' | 'H' | 'M' | 'S') => pattern.push_str(r"\d{1,2}"),
            Some('T') => pattern.push_str(r"\d{1,2}:\d{1,2}:\d{1,2}"),
            Some('R') => pattern.push_str(r"\d{1,2}:\d{1,2}"),
            Some('%') => pattern.push('%'),
            Some(_) => pattern.push_str(".+?"),
            None => {}
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Extract the reporting month from the start of a file name.
///
/// The leading `YYYY.MM` token (`2023.04_report.xls`) is read as the 1st of
/// that month. A token with any other separator or a short year is invalid.
pub fn parsed_on_from_file_name(file_name: &str) -> Result<NaiveDate, FilenameDateError> {
    let captures = Regex::new(r"^(\d{2,4}).(\d{1,2})")
        .ok()
        .and_then(|re| re.captures(file_name))
        .ok_or_else(|| FilenameDateError::Missing(file_name.to_string()))?;

    let token = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
    let invalid = || FilenameDateError::Invalid {
        file_name: file_name.to_string(),
        token: token.to_string(),
    };

    let year_digits = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    if year_digits.len() != 4 {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(&format!("{}.01", token), "%Y.%m.%d").map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIPMENT_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y-%m-%d %H:%M:%S"];
    const ORDERS_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%d.%m.%Y",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];

    #[test]
    fn test_shipment_formats() {
        assert_eq!(convert_format_date("2023-01-15", SHIPMENT_FORMATS).as_deref(), Some("2023-01-15"));
        assert_eq!(convert_format_date("15.01.2023", SHIPMENT_FORMATS).as_deref(), Some("2023-01-15"));
        assert_eq!(
            convert_format_date("2023-01-15 00:00:00", SHIPMENT_FORMATS).as_deref(),
            Some("2023-01-15")
        );
    }

    #[test]
    fn test_orders_formats() {
        assert_eq!(
            convert_format_date("2024-02-29 13:45:00", ORDERS_FORMATS).as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(
            convert_format_date("29.02.2024 13:45:10", ORDERS_FORMATS).as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(
            convert_format_date("29.02.2024 13:45", ORDERS_FORMATS).as_deref(),
            Some("2024-02-29")
        );
        // date-only ISO is not an orders format
        assert_eq!(convert_format_date("2024-02-29", ORDERS_FORMATS), None);
    }

    #[test]
    fn test_formatted_dates_convert_back() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let dt = date.and_hms_opt(23, 59, 1).unwrap();
        for format in ORDERS_FORMATS.iter().chain(SHIPMENT_FORMATS) {
            let text = dt.format(format).to_string();
            assert_eq!(convert_format_date(&text, &[*format]).as_deref(), Some("1999-12-31"));
        }
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(convert_format_date("not-a-date", SHIPMENT_FORMATS), None);
        assert_eq!(convert_format_date("nan", SHIPMENT_FORMATS), None);
        assert_eq!(convert_format_date("31.02.2023", SHIPMENT_FORMATS), None);
        assert_eq!(convert_format_date("", ORDERS_FORMATS), None);
    }

    #[test]
    fn test_short_year_is_none() {
        assert_eq!(convert_format_date("15.01.23", SHIPMENT_FORMATS), None);
        assert_eq!(convert_format_date("15.01.23 10:30", ORDERS_FORMATS), None);
        assert_eq!(convert_format_date("23-01-15", SHIPMENT_FORMATS), None);
        assert_eq!(convert_format_date("15.01.20231", SHIPMENT_FORMATS), None);
    }

    #[test]
    fn test_single_digit_month_and_day() {
        assert_eq!(convert_format_date("2023-1-5", SHIPMENT_FORMATS).as_deref(), Some("2023-01-05"));
        assert_eq!(convert_format_date("5.1.2023 7:05", ORDERS_FORMATS).as_deref(), Some("2023-01-05"));
    }

    #[test]
    fn test_parsed_on_from_file_name() {
        let date = parsed_on_from_file_name("2023.04_report.xls").unwrap();
        assert_eq!(date.format(ISO_DATE_FORMAT).to_string(), "2023-04-01");

        let date = parsed_on_from_file_name("2022.1 отгрузки.xls").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    }

    #[test]
    fn test_parsed_on_requires_dot_separator() {
        for name in ["2022-1 отгрузки.xls", "2023-04_export.xls", "202312_export.xls"] {
            let err = parsed_on_from_file_name(name).unwrap_err();
            assert!(matches!(err, FilenameDateError::Invalid { .. }), "{name}");
        }
    }

    #[test]
    fn test_parsed_on_missing() {
        let err = parsed_on_from_file_name("report.xls").unwrap_err();
        assert!(matches!(err, FilenameDateError::Missing(_)));
        assert!(err.to_string().contains("Date not in file name!"));
    }

    #[test]
    fn test_parsed_on_invalid_month() {
        let err = parsed_on_from_file_name("2023.13_report.xls").unwrap_err();
        assert!(matches!(err, FilenameDateError::Invalid { .. }));

        let err = parsed_on_from_file_name("23.04_report.xls").unwrap_err();
        assert!(matches!(err, FilenameDateError::Invalid { .. }));
    }
}
