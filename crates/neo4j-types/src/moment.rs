//! `Moment`: a date-manipulation wrapper around a host wall clock.
//!
//! A `Moment` may be invalid (the result of a failed parse); every accessor
//! then returns `None`. Formats use moment-style tokens such as `DD/MM/YYYY`
//! or `YYYY-MM-DD HH:mm:ss.SSS`. Text inside square brackets is literal.

use crate::temporal::epoch_day;
use chrono::format::{Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use std::fmt;

/// Tokens recognised in moment-style formats, longest first.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("M", "%-m"),
    ("D", "%-d"),
    ("H", "%-H"),
    ("m", "%-M"),
    ("s", "%-S"),
];

/// Translate a moment-style format into a chrono `strftime` pattern.
pub fn to_chrono_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'scan: while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                out.push_str(&rest[1..end].replace('%', "%%"));
                rest = &rest[end + 1..];
                continue;
            }
        }
        for (token, pattern) in TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                out.push_str(pattern);
                rest = after;
                continue 'scan;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Moment {
    inner: Option<NaiveDateTime>,
}

impl Moment {
    pub fn new(dt: NaiveDateTime) -> Self {
        Self { inner: Some(dt) }
    }

    pub fn invalid() -> Self {
        Self { inner: None }
    }

    /// Parse `input` with a moment-style `format`.
    ///
    /// Fields the format leaves out are filled in: month and day default to
    /// 1, time fields to 0, a missing year to the current one. Formats with
    /// only time tokens land on the epoch day.
    pub fn parse(input: &str, format: &str) -> Self {
        let pattern = to_chrono_format(format);
        let mut parsed = Parsed::new();
        let items = StrftimeItems::new(&pattern);
        if chrono::format::parse(&mut parsed, input.trim(), items).is_err() {
            return Self::invalid();
        }
        Self {
            inner: resolve(parsed),
        }
    }

    /// Milliseconds since the Unix epoch, as a UTC wall clock.
    pub fn from_millis(millis: i64) -> Self {
        Self {
            inner: DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    pub fn to_date(&self) -> Option<NaiveDateTime> {
        self.inner
    }

    /// Milliseconds since the Unix epoch, reading the wall clock as UTC.
    pub fn value_of(&self) -> Option<i64> {
        self.inner.map(|dt| dt.and_utc().timestamp_millis())
    }

    pub fn format(&self, format: &str) -> Option<String> {
        let pattern = to_chrono_format(format);
        self.inner.map(|dt| dt.format(&pattern).to_string())
    }

    pub fn add(&self, delta: TimeDelta) -> Self {
        Self {
            inner: self.inner.and_then(|dt| dt.checked_add_signed(delta)),
        }
    }

    pub fn start_of_day(&self) -> Self {
        Self {
            inner: self.inner.map(|dt| dt.date().and_time(NaiveTime::MIN)),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.inner.map(|dt| dt.year())
    }

    /// Month of the year, 0-based.
    pub fn month(&self) -> Option<u32> {
        self.inner.map(|dt| dt.month0())
    }

    /// Day of the month, 1-based.
    pub fn date(&self) -> Option<u32> {
        self.inner.map(|dt| dt.day())
    }

    pub fn hour(&self) -> Option<u32> {
        self.inner.map(|dt| dt.hour())
    }

    pub fn minute(&self) -> Option<u32> {
        self.inner.map(|dt| dt.minute())
    }

    pub fn second(&self) -> Option<u32> {
        self.inner.map(|dt| dt.second())
    }
}

fn resolve(mut parsed: Parsed) -> Option<NaiveDateTime> {
    let has_date = parsed.year().is_some()
        || parsed.year_mod_100().is_some()
        || parsed.month().is_some()
        || parsed.day().is_some();

    if parsed.hour_div_12().is_none() {
        parsed.set_hour(0).ok()?;
    }
    if parsed.minute().is_none() {
        parsed.set_minute(0).ok()?;
    }
    let time = parsed.to_naive_time().ok()?;
    if !has_date {
        return Some(epoch_day().and_time(time));
    }

    if parsed.year().is_none() && parsed.year_mod_100().is_none() {
        parsed.set_year(i64::from(Utc::now().year())).ok()?;
    }
    if parsed.month().is_none() {
        parsed.set_month(1).ok()?;
    }
    if parsed.day().is_none() {
        parsed.set_day(1).ok()?;
    }
    Some(parsed.to_naive_date().ok()?.and_time(time))
}

impl From<NaiveDateTime> for Moment {
    fn from(dt: NaiveDateTime) -> Self {
        Self::new(dt)
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
            None => write!(f, "Invalid date"),
        }
    }
}
