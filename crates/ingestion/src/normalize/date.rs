//! Date parsing with an ordered fallback chain.
//!
//! 1. ISO-like formats (RFC 3339, `YYYY-MM-DD[ T]HH:MM[:SS]`, ...)
//! 2. `MM/DD/YYYY`
//! 3. `DD/MM/YYYY`
//! 4. Bare integer as a Unix timestamp (seconds below 1e10, else milliseconds)
//!
//! The first step that yields a valid calendar date wins. Ambiguous slash dates
//! such as `03/04/2024` therefore resolve as month-first.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Integers below this are Unix seconds, at or above it Unix milliseconds.
const UNIX_MILLIS_THRESHOLD: i64 = 10_000_000_000;

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TEXT_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Which step of the chain produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Iso,
    MonthDayYear,
    DayMonthYear,
    UnixSeconds,
    UnixMillis,
}

/// A successfully parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub value: DateTime<Utc>,
    pub format: DateFormat,
}

/// Run the fallback chain. `None` if no step yields a valid date.
pub fn parse_date(raw: &str) -> Option<ParsedDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let steps: [(fn(&str) -> Option<DateTime<Utc>>, DateFormat); 3] = [
        (parse_iso, DateFormat::Iso),
        (parse_month_first, DateFormat::MonthDayYear),
        (parse_day_first, DateFormat::DayMonthYear),
    ];
    for (step, format) in steps {
        if let Some(value) = step(s) {
            return Some(ParsedDate { value, format });
        }
    }

    parse_unix(s)
}

/// Parse a date, defaulting to `fallback` instead of failing.
pub fn parse_date_or(raw: &str, fallback: DateTime<Utc>) -> DateTime<Utc> {
    parse_date(raw).map(|d| d.value).unwrap_or(fallback)
}

/// `YYYY-` or `YYYY/` prefix. chrono's `%Y` accepts short years, so `1/5/24`
/// must not reach the year-first formats.
fn is_year_first(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() > 4
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && matches!(bytes[4], b'-' | b'/')
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if is_year_first(s) {
        for fmt in ISO_DATETIME_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&ndt));
            }
        }
        for fmt in ISO_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
            }
        }
        return None;
    }
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

fn parse_month_first(s: &str) -> Option<DateTime<Utc>> {
    parse_numeric_date(s, |first, second| (first, second))
}

fn parse_day_first(s: &str) -> Option<DateTime<Utc>> {
    parse_numeric_date(s, |first, second| (second, first))
}

/// Parse `A/B/YYYY [time]`, where `order` turns (A, B) into (month, day).
fn parse_numeric_date(s: &str, order: fn(u32, u32) -> (u32, u32)) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match s.split_once(char::is_whitespace) {
        Some((d, t)) => (d, t.trim()),
        None => (s, ""),
    };

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || p.len() > 4) {
        return None;
    }
    let first: u32 = parts[0].parse().ok()?;
    let second: u32 = parts[1].parse().ok()?;
    let year = match parts[2].len() {
        2 => 2000 + parts[2].parse::<i32>().ok()?,
        4 => parts[2].parse::<i32>().ok()?,
        _ => return None,
    };
    // Year-first strings belong to the ISO step
    if parts[0].len() > 2 || parts[1].len() > 2 {
        return None;
    }

    let (month, day) = order(first, second);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = parse_time(time_part).unwrap_or(NaiveTime::MIN);
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    if s.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn parse_unix(s: &str) -> Option<ParsedDate> {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    if n < UNIX_MILLIS_THRESHOLD {
        Utc.timestamp_opt(n, 0).single().map(|value| ParsedDate {
            value,
            format: DateFormat::UnixSeconds,
        })
    } else {
        Utc.timestamp_millis_opt(n).single().map(|value| ParsedDate {
            value,
            format: DateFormat::UnixMillis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ymd(d: DateTime<Utc>) -> (i32, u32, u32) {
        (d.year(), d.month(), d.day())
    }

    #[test]
    fn test_iso_formats() {
        let d = parse_date("2024-01-15").unwrap();
        assert_eq!(d.format, DateFormat::Iso);
        assert_eq!(ymd(d.value), (2024, 1, 15));

        let d = parse_date("2024-01-15T09:30:00Z").unwrap();
        assert_eq!(d.value.hour(), 9);
        assert_eq!(d.value.minute(), 30);

        let d = parse_date("2024-01-15T14:30:00+05:00").unwrap();
        assert_eq!(d.value.hour(), 9);

        let d = parse_date("2024-01-15 09:30:15.250").unwrap();
        assert_eq!(d.value.second(), 15);

        let d = parse_date("2024-01-15 16:00").unwrap();
        assert_eq!(d.value.hour(), 16);

        assert_eq!(ymd(parse_date("Jan 15, 2024").unwrap().value), (2024, 1, 15));
        assert_eq!(ymd(parse_date("15 March 2024").unwrap().value), (2024, 3, 15));
    }

    #[test]
    fn test_month_first_slash() {
        let d = parse_date("01/15/2024").unwrap();
        assert_eq!(d.format, DateFormat::MonthDayYear);
        assert_eq!(ymd(d.value), (2024, 1, 15));

        // Ambiguous dates resolve month-first
        let d = parse_date("03/04/2024").unwrap();
        assert_eq!(ymd(d.value), (2024, 3, 4));

        let d = parse_date("1/5/24 14:05").unwrap();
        assert_eq!(ymd(d.value), (2024, 1, 5));
        assert_eq!(d.value.hour(), 14);

        let d = parse_date("01/15/2024 2:30:00 PM").unwrap();
        assert_eq!(d.value.hour(), 14);
    }

    #[test]
    fn test_day_first_fallback() {
        // Month 15 is invalid, so the day-first step takes it
        let d = parse_date("15/01/2024").unwrap();
        assert_eq!(d.format, DateFormat::DayMonthYear);
        assert_eq!(ymd(d.value), (2024, 1, 15));

        let d = parse_date("31.12.2023").unwrap();
        assert_eq!(ymd(d.value), (2023, 12, 31));
    }

    #[test]
    fn test_unix_timestamps() {
        let d = parse_date("1705312800").unwrap();
        assert_eq!(d.format, DateFormat::UnixSeconds);
        assert_eq!(ymd(d.value), (2024, 1, 15));

        let d = parse_date("1705312800000").unwrap();
        assert_eq!(d.format, DateFormat::UnixMillis);
        assert_eq!(ymd(d.value), (2024, 1, 15));
    }

    #[test]
    fn test_invalid_dates() {
        assert!(parse_date("").is_none());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("13/13/2024").is_none());
        assert!(parse_date("2024-02-30").is_none());
        assert!(parse_date("-5").is_none());
    }

    #[test]
    fn test_fallback() {
        let fallback = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_date_or("garbage", fallback), fallback);
        assert_eq!(ymd(parse_date_or("2024-01-15", fallback)), (2024, 1, 15));
    }
}
