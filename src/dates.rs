//! Free-form date text to a sortable key.
//!
//! Sites print dates however they like ("March 3, 2024", "Mon, 4 Mar 2024
//! 10:00:00 GMT", "2024-03-04", "3rd March 2024"...). [`normalize`] turns any
//! of the supported forms into Unix seconds, so later dates compare greater.
//! Date-only input maps to UTC midnight.
//!
//! Some archive pages omit the year; [`infer_year`] completes such text from
//! a reference date before it is normalized.

use crate::error::UnparseableDate;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());
static LEADING_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)[a-z]*\.?,?\s+").unwrap()
});
static ABBREVIATION_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z])\.").unwrap());
static SEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsept\b").unwrap());
static FOUR_DIGIT_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// `%B` also accepts the three-letter abbreviation when parsing.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

/// Convert date text into a sort key (Unix seconds, UTC).
///
/// # Errors
///
/// [`UnparseableDate`] when the text matches no supported form or names a
/// day that does not exist (`February 30, 2024`). Callers treat this as
/// "dateless", never as fatal.
pub fn normalize(date_text: &str) -> Result<i64, UnparseableDate> {
    let raw = date_text.trim();
    let fail = || UnparseableDate {
        input: date_text.to_string(),
    };
    if raw.is_empty() {
        return Err(fail());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Ok(dt.timestamp());
    }

    let cleaned = clean(raw);

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return midnight_key(date).ok_or_else(fail);
        }
    }

    Err(fail())
}

/// Append a year to date text that lacks one.
///
/// Uses the year of `today`, or the year before when that would put the date
/// in the future (a "December 30" heading read on January 2nd). Text that
/// already carries a four-digit year is returned unchanged, as is text that
/// doesn't parse either way; the normalizer reports those.
pub fn infer_year(date_text: &str, today: NaiveDate) -> String {
    let trimmed = date_text.trim();
    if FOUR_DIGIT_YEAR.is_match(trimmed) {
        return trimmed.to_string();
    }

    let year = chrono::Datelike::year(&today);
    let this_year = format!("{trimmed}, {year}");
    let Some(limit) = midnight_key(today) else {
        return this_year;
    };

    match normalize(&this_year) {
        Ok(key) if key > limit => format!("{trimmed}, {}", year - 1),
        _ => this_year,
    }
}

fn midnight_key(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp())
}

fn clean(raw: &str) -> String {
    let s = LEADING_WEEKDAY.replace(raw, "");
    let s = ORDINAL_SUFFIX.replace_all(&s, "$1");
    let s = ABBREVIATION_DOT.replace_all(&s, "$1");
    let s = SEPT.replace_all(&s, "Sep");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> i64 {
        normalize(s).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn test_later_dates_compare_greater() {
        assert!(key("March 3, 2024") > key("March 1, 2024"));
        assert!(key("January 1, 2025") > key("December 31, 2024"));
    }

    #[test]
    fn test_not_a_date_fails() {
        let err = normalize("not a date").unwrap_err();
        assert_eq!(err.input, "not a date");
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
    }

    #[test]
    fn test_impossible_calendar_day_fails() {
        assert!(normalize("February 30, 2024").is_err());
        assert!(normalize("2023-02-29").is_err());
        assert!(normalize("2024-02-29").is_ok());
    }

    #[test]
    fn test_equivalent_forms_agree() {
        let expected = key("2024-03-03");
        assert_eq!(key("March 3, 2024"), expected);
        assert_eq!(key("Mar 3, 2024"), expected);
        assert_eq!(key("Mar. 3, 2024"), expected);
        assert_eq!(key("3 March 2024"), expected);
        assert_eq!(key("3rd March 2024"), expected);
        assert_eq!(key("Sunday, March 3rd, 2024"), expected);
        assert_eq!(key("03/03/2024"), expected);
        assert_eq!(key("  March   3,  2024 "), expected);
    }

    #[test]
    fn test_sept_abbreviation() {
        assert_eq!(key("Sept. 9, 2024"), key("2024-09-09"));
    }

    #[test]
    fn test_date_only_is_utc_midnight() {
        assert_eq!(key("1970-01-02"), 86_400);
    }

    #[test]
    fn test_timestamps_with_time_of_day() {
        assert_eq!(key("2024-03-03T00:00:00Z"), key("2024-03-03"));
        assert_eq!(key("2024-03-03T10:30:00+00:00"), key("2024-03-03") + 37_800);
        assert_eq!(key("Sun, 03 Mar 2024 10:30:00 GMT"), key("2024-03-03") + 37_800);
        assert_eq!(key("2024-03-03 10:30"), key("2024-03-03") + 37_800);
    }

    #[test]
    fn test_infer_year_uses_current_year() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(infer_year("March 3", today), "March 3, 2024");
        assert_eq!(infer_year("June 15", today), "June 15, 2024");
        assert_eq!(key(&infer_year("March 3", today)), key("March 3, 2024"));
    }

    #[test]
    fn test_infer_year_rolls_back_future_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(infer_year("December 30", today), "December 30, 2024");
    }

    #[test]
    fn test_infer_year_keeps_explicit_year() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(infer_year("December 30, 2019", today), "December 30, 2019");
    }

    #[test]
    fn test_infer_year_with_weekday_heading() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let text = infer_year("Monday 3 June", today);
        assert_eq!(key(&text), key("2024-06-03"));
    }
}
