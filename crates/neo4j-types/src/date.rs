//! Date parsing: loosely-typed date input → wire `Temporal`.
//!
//! Parsing never fails loudly. Anything that cannot be read as a date yields
//! `None`, so callers can accept "any date-like thing" and check the result.

use crate::moment::Moment;
use crate::temporal::{utc_offset, Temporal, TemporalKind};
use crate::value::{Map, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Format used for string input when none is given.
pub const DEFAULT_INPUT_FORMAT: &str = "DD/MM/YYYY";

const DATE_PART_KEYS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// Calendar fields given individually. Month is 1-based.
///
/// Missing fields default to 1970-01-01 00:00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateParts {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl DateParts {
    /// Read date parts from a map. Returns `None` unless at least one of
    /// year/month/day/hour/minute/second is present.
    pub fn from_map(map: &Map) -> Option<Self> {
        if !DATE_PART_KEYS.iter().any(|k| map.contains_key(*k)) {
            return None;
        }
        let field = |key: &str| map.get(key).and_then(Value::as_i64);
        Some(Self {
            year: field("year").and_then(|v| i32::try_from(v).ok()),
            month: field("month").and_then(|v| u32::try_from(v).ok()),
            day: field("day").and_then(|v| u32::try_from(v).ok()),
            hour: field("hour").and_then(|v| u32::try_from(v).ok()),
            minute: field("minute").and_then(|v| u32::try_from(v).ok()),
            second: field("second").and_then(|v| u32::try_from(v).ok()),
        })
    }

    pub fn to_host_date(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year.unwrap_or(1970),
            self.month.unwrap_or(1),
            self.day.unwrap_or(1),
        )?;
        let time = NaiveTime::from_hms_opt(
            self.hour.unwrap_or(0),
            self.minute.unwrap_or(0),
            self.second.unwrap_or(0),
        )?;
        Some(date.and_time(time))
    }
}

/// Anything `parse_date` accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Temporal(Temporal),
    Native(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
    Moment(Moment),
    Parts(DateParts),
    Text(String),
    /// Milliseconds since the epoch, or digits to parse with a format.
    Epoch(i64),
}

impl DateInput {
    /// Interpret a host value as date input.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Temporal(t) => Some(DateInput::Temporal(*t)),
            Value::Wire(bolt) => Temporal::from_bolt(bolt)?.ok().map(DateInput::Temporal),
            Value::Moment(m) => Some(DateInput::Moment(*m)),
            Value::Date(dt) => Some(DateInput::Native(*dt)),
            Value::Map(map) => DateParts::from_map(map).map(DateInput::Parts),
            Value::String(s) => Some(DateInput::Text(s.clone())),
            Value::Integer(i) => Some(DateInput::Epoch(*i)),
            _ => None,
        }
    }

    fn is_falsy(&self) -> bool {
        matches!(self, DateInput::Text(s) if s.trim().is_empty())
    }
}

impl From<Temporal> for DateInput {
    fn from(t: Temporal) -> Self {
        DateInput::Temporal(t)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::Native(dt)
    }
}

impl From<DateTime<FixedOffset>> for DateInput {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        DateInput::Zoned(dt)
    }
}

impl From<Moment> for DateInput {
    fn from(m: Moment) -> Self {
        DateInput::Moment(m)
    }
}

impl From<DateParts> for DateInput {
    fn from(parts: DateParts) -> Self {
        DateInput::Parts(parts)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<i64> for DateInput {
    fn from(millis: i64) -> Self {
        DateInput::Epoch(millis)
    }
}

/// Parse date-like input into a wire temporal of the given kind.
///
/// Strings are read with `input_format` (default [`DEFAULT_INPUT_FORMAT`]).
/// Integers are epoch milliseconds unless a format is given, in which case
/// their decimal text is parsed with it. Zoned inputs keep their offset when
/// encoded as `DateTime`/`Time`; other inputs are encoded at UTC.
pub fn parse_date(
    input: impl Into<DateInput>,
    kind: TemporalKind,
    input_format: Option<&str>,
) -> Option<Temporal> {
    let input = input.into();
    if input.is_falsy() {
        return None;
    }

    let (host, offset) = match input {
        DateInput::Temporal(t) => (t.to_host_date(), t.offset().unwrap_or_else(utc_offset)),
        DateInput::Native(dt) => (dt, utc_offset()),
        DateInput::Zoned(dt) => (dt.naive_local(), *dt.offset()),
        DateInput::Moment(m) => (m.to_date()?, utc_offset()),
        DateInput::Parts(parts) => (parts.to_host_date()?, utc_offset()),
        DateInput::Text(s) => {
            let format = input_format.unwrap_or(DEFAULT_INPUT_FORMAT);
            (Moment::parse(&s, format).to_date()?, utc_offset())
        }
        DateInput::Epoch(millis) => {
            let moment = match input_format {
                Some(format) => Moment::parse(&millis.to_string(), format),
                None => Moment::from_millis(millis),
            };
            (moment.to_date()?, utc_offset())
        }
    };

    let parsed = kind.encode(host, offset);
    if parsed.is_none() {
        tracing::debug!("Could not encode {host} as {kind:?}");
    }
    parsed
}

/// Parse date-like input and render it as a Cypher temporal constructor,
/// e.g. `localdatetime('2024-06-15T10:30:00')`.
pub fn parse_date_cypher(
    input: impl Into<DateInput>,
    kind: TemporalKind,
    input_format: Option<&str>,
) -> Option<String> {
    parse_date(input, kind, input_format)
        .map(|t| format!("{}('{}')", kind.cypher_function(), t))
}
