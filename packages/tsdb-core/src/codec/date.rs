//! The TSDB date grammar.
//!
//! Dates are written `D-mon-YYYY` with an optional time, but a number of
//! looser shapes are accepted on input:
//!
//! - `YYYY-M(M)(-D(D))?` optionally followed by `HH:MM(:SS)?`, bare or
//!   in parentheses
//! - `(D(D)-)?M(M|mon)-YY(YY)?` with the same optional time
//! - `today`/`now` (optionally prefixed with `:`) for the current time
//!
//! Two-digit years pivot on 93: `93`..`99` are 19xx, everything else 20xx.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use regex::{Captures, Regex};

use crate::error::{DbError, Result};

/// Month abbreviations, January first.
pub const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// First two-digit year read as 19xx.
const CENTURY_PIVOT: u32 = 93;

static NOW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:?(today|now)").unwrap());

static YMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?P<y>[0-9]{4})
        -(?P<m>[0-9]{1,2}|\w{3})
        (?:-(?P<d>[0-9]{1,2}))?
        (?:\s*\(?
            (?P<H>[0-9]{2}):(?P<M>[0-9]{2})(?::(?P<S>[0-9]{2}))?
        \)?)?",
    )
    .unwrap()
});

static DMY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^
        (?:(?P<d>[0-9]{1,2})-)?
        (?P<m>[0-9]{1,2}|\w{3})
        -(?P<y>[0-9]{2}(?:[0-9]{2})?)
        (?:\s*\(?
            (?P<H>[0-9]{2}):(?P<M>[0-9]{2})(?::(?P<S>[0-9]{2}))?
        \)?)?",
    )
    .unwrap()
});

/// Looks up a month number (1-12) from its three-letter abbreviation.
pub fn month_number(abbrev: &str) -> Option<u32> {
    let lower = abbrev.to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|idx| idx as u32 + 1)
}

/// Parses a TSDB date string.
///
/// Only the matched prefix of `s` is interpreted; trailing text after a
/// recognised date is ignored.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    if NOW_RE.is_match(s) {
        return Ok(Local::now().naive_local());
    }
    let caps = YMD_RE
        .captures(s)
        .or_else(|| DMY_RE.captures(s))
        .ok_or_else(|| DbError::InvalidDate(s.to_string()))?;
    build_datetime(&caps).ok_or_else(|| DbError::InvalidDate(s.to_string()))
}

fn build_datetime(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let number = |name: &str, default: u32| -> Option<u32> {
        match caps.name(name) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let y = caps.name("y")?.as_str();
    let mut year: i32 = y.parse().ok()?;
    if y.len() == 2 {
        year += if year as u32 >= CENTURY_PIVOT { 1900 } else { 2000 };
    }

    let m = caps.name("m")?.as_str();
    let month = if m.len() == 3 {
        month_number(m)?
    } else {
        m.parse().ok()?
    };

    NaiveDate::from_ymd_opt(year, month, number("d", 1)?)?.and_hms_opt(
        number("H", 0)?,
        number("M", 0)?,
        number("S", 0)?,
    )
}

/// Formats a timestamp as `D-mon-YYYY`, adding ` HH:MM:SS` when the time
/// is not midnight.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    let month = MONTHS[dt.month0() as usize];
    let mut out = format!("{}-{}-{}", dt.day(), month, dt.year());
    if (dt.hour(), dt.minute(), dt.second()) != (0, 0, 0) {
        out.push_str(&dt.format(" %H:%M:%S").to_string());
    }
    out
}
