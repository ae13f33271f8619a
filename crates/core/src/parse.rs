//! Lenient value parsing for raw survey columns.
//!
//! Both parsers return `None` instead of failing: a value that cannot be
//! understood is treated as absent and the record is kept.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Accepted response years.
const MIN_YEAR: i32 = 2000;
const MAX_YEAR: i32 = 2099;

static SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));

static DASH_DMY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("valid regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Parse a 0-10 satisfaction score.
///
/// Thousands separators and spaces are stripped. Values on a 0-100 scale are
/// scaled down to 0-10.
pub fn parse_score(value: &str) -> Option<u8> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let n: f64 = cleaned.parse().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }

    let scaled = if n <= 10.0 {
        n
    } else if n <= 100.0 {
        n / 10.0
    } else {
        return None;
    };

    Some(scaled.round() as u8)
}

/// Parse a response date/time.
///
/// Date-only values resolve to midnight UTC. Slash dates are read as
/// month/day/year unless the first component cannot be a month.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    let parsed = parse_rfc3339(s)
        .or_else(|| parse_naive_datetime(s))
        .or_else(|| parse_naive_date(s).map(midnight))
        .or_else(|| parse_slash_date(s).map(midnight))
        .or_else(|| parse_dash_dmy(s).map(midnight))?;

    (MIN_YEAR..=MAX_YEAR)
        .contains(&parsed.year())
        .then_some(parsed)
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive_datetime(s: &str) -> Option<DateTime<Utc>> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_naive_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let caps = SLASH_DATE.captures(s)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    if first > 12 {
        NaiveDate::from_ymd_opt(year, second, first)
    } else {
        NaiveDate::from_ymd_opt(year, first, second)
    }
}

fn parse_dash_dmy(s: &str) -> Option<NaiveDate> {
    let caps = DASH_DMY_DATE.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
