// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" cell/date handling so the rest of the
// code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use num_format::{Locale, ToFormattedString};

// Tracker exports are day-first; ISO forms show up when a sheet was
// re-saved from another tool.
const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %I:%M %p",
    "%d-%b-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%d-%b-%Y"];

/// Trim a cell and drop it if nothing is left.
pub fn clean_cell(s: Option<&str>) -> Option<String> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    Some(s.to_string())
}

/// Parse a timestamp cell, day-first. A bare date is taken as midnight.
/// Anything unparseable is `None` rather than an error: a bad cell only
/// removes the ticket from date-based breakdowns.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `"  in PROGRESS"` -> `"In Progress"`.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `part / total * 100`, or 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators (e.g., `1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_val: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Used for counts in console messages (e.g., `1,204 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_day_first_timestamps() {
        let ts = parse_datetime_safe(Some("03/12/2025 14:05")).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 12, 3).unwrap());

        let iso = parse_datetime_safe(Some("2025-12-03 14:05:00")).unwrap();
        assert_eq!(iso, ts);

        let bare = parse_datetime_safe(Some("03-12-2025")).unwrap();
        assert_eq!(bare.date(), ts.date());
    }

    #[test]
    fn unparseable_timestamps_are_none() {
        assert_eq!(parse_datetime_safe(Some("soon")), None);
        assert_eq!(parse_datetime_safe(Some("  ")), None);
        assert_eq!(parse_datetime_safe(None), None);
    }

    #[test]
    fn percent_never_divides_by_zero() {
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(percent(7, 10), 70.0);
    }

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(1234.5, 1), "1,234.5");
        assert_eq!(format_number(-12.0, 0), "-12");
        assert_eq!(format_int(9855), "9,855");
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("  closed "), "Closed");
        assert_eq!(title_case("ON hold"), "On Hold");
    }
}
