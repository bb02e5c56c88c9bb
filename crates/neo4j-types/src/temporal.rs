//! Temporal adapter: Neo4j Bolt temporal values ⇄ chrono calendar values.
//!
//! `Temporal` mirrors the five Bolt temporal structures (`Date`, `DateTime`,
//! `LocalDateTime`, `Time`, `LocalTime`) with chrono types. Conversions to host
//! dates live here instead of on the `neo4rs` types themselves.
//!
//! ## Host dates
//!
//! A host date is a `NaiveDateTime` wall clock. Variants without a date portion
//! (`Time`, `LocalTime`) are placed on the fixed epoch day 1970-01-01. Zoned
//! variants keep their own wall-clock fields unless a target timezone is given.

use crate::error::{Neo4jTypesError, Result};
use crate::moment::Moment;
use crate::value::Value;
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use neo4rs::{BoltDate, BoltDateTime, BoltLocalDateTime, BoltLocalTime, BoltTime, BoltType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The date portion used for time-only values.
pub(crate) fn epoch_day() -> NaiveDate {
    // NaiveDate's default is 1970-01-01
    NaiveDate::default()
}

pub(crate) fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Selects which Bolt temporal structure a host date is encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    DateTime,
    #[default]
    LocalDateTime,
    Time,
    LocalTime,
}

impl TemporalKind {
    /// Name of the Cypher function constructing this kind of value.
    pub fn cypher_function(&self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::DateTime => "datetime",
            TemporalKind::LocalDateTime => "localdatetime",
            TemporalKind::Time => "time",
            TemporalKind::LocalTime => "localtime",
        }
    }

    /// Encode a host wall clock into this kind.
    ///
    /// `offset` is only used by the zoned kinds (`DateTime`, `Time`).
    pub fn encode(&self, host: NaiveDateTime, offset: FixedOffset) -> Option<Temporal> {
        let temporal = match self {
            TemporalKind::Date => Temporal::Date(host.date()),
            TemporalKind::DateTime => {
                Temporal::DateTime(offset.from_local_datetime(&host).single()?)
            }
            TemporalKind::LocalDateTime => Temporal::LocalDateTime(host),
            TemporalKind::Time => Temporal::Time(host.time(), offset),
            TemporalKind::LocalTime => Temporal::LocalTime(host.time()),
        };
        Some(temporal)
    }
}

impl std::str::FromStr for TemporalKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "date" => Ok(TemporalKind::Date),
            "datetime" => Ok(TemporalKind::DateTime),
            "localdatetime" => Ok(TemporalKind::LocalDateTime),
            "time" => Ok(TemporalKind::Time),
            "localtime" => Ok(TemporalKind::LocalTime),
            other => Err(format!("unknown temporal kind: {other}")),
        }
    }
}

/// A Bolt temporal value held as chrono types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    Time(NaiveTime, FixedOffset),
    LocalTime(NaiveTime),
}

impl Temporal {
    /// Decode a Bolt value. Returns `None` for non-temporal values.
    pub fn from_bolt(bolt: &BoltType) -> Option<Result<Temporal>> {
        let decoded = match bolt {
            BoltType::Date(date) => date
                .clone()
                .try_into()
                .map(Temporal::Date)
                .map_err(|e| Neo4jTypesError::InvalidDate {
                    reason: format!("Failed to convert BoltDate: {e}"),
                }),
            BoltType::DateTime(dt) => dt
                .clone()
                .try_into()
                .map(Temporal::DateTime)
                .map_err(|e| Neo4jTypesError::InvalidDateTime {
                    reason: format!("Failed to convert BoltDateTime: {e}"),
                }),
            BoltType::DateTimeZoneId(dt_zone) => {
                let converted: std::result::Result<DateTime<FixedOffset>, _> =
                    dt_zone.try_into();
                converted
                    .map(Temporal::DateTime)
                    .map_err(|e| Neo4jTypesError::InvalidDateTime {
                        reason: format!("Failed to convert BoltDateTimeZoneId: {e}"),
                    })
            }
            BoltType::LocalDateTime(local_dt) => local_dt
                .clone()
                .try_into()
                .map(Temporal::LocalDateTime)
                .map_err(|e| Neo4jTypesError::InvalidDateTime {
                    reason: format!("Failed to convert BoltLocalDateTime: {e}"),
                }),
            BoltType::Time(time) => {
                let (naive_time, offset): (NaiveTime, FixedOffset) = time.clone().into();
                Ok(Temporal::Time(naive_time, offset))
            }
            BoltType::LocalTime(local_time) => {
                let naive_time: NaiveTime = local_time.clone().into();
                Ok(Temporal::LocalTime(naive_time))
            }
            _ => return None,
        };
        Some(decoded)
    }

    pub fn kind(&self) -> TemporalKind {
        match self {
            Temporal::Date(_) => TemporalKind::Date,
            Temporal::DateTime(_) => TemporalKind::DateTime,
            Temporal::LocalDateTime(_) => TemporalKind::LocalDateTime,
            Temporal::Time(..) => TemporalKind::Time,
            Temporal::LocalTime(_) => TemporalKind::LocalTime,
        }
    }

    /// UTC offset carried by zoned variants.
    pub fn offset(&self) -> Option<FixedOffset> {
        match self {
            Temporal::DateTime(dt) => Some(*dt.offset()),
            Temporal::Time(_, offset) => Some(*offset),
            _ => None,
        }
    }

    /// Convert to a host wall clock using the value's own fields.
    pub fn to_host_date(&self) -> NaiveDateTime {
        match self {
            Temporal::Date(date) => date.and_time(NaiveTime::MIN),
            Temporal::DateTime(dt) => dt.naive_local(),
            Temporal::LocalDateTime(dt) => *dt,
            Temporal::Time(time, _) | Temporal::LocalTime(time) => epoch_day().and_time(*time),
        }
    }

    /// Convert to a host wall clock, shifting zoned values into `tz` first.
    pub fn to_host_date_in(&self, tz: &Tz) -> NaiveDateTime {
        match self {
            Temporal::DateTime(dt) => dt.with_timezone(tz).naive_local(),
            Temporal::Time(time, offset) => {
                let on_epoch = epoch_day().and_time(*time);
                match offset.from_local_datetime(&on_epoch).single() {
                    Some(instant) => instant.with_timezone(tz).naive_local(),
                    None => on_epoch,
                }
            }
            _ => self.to_host_date(),
        }
    }

    /// Wrap the host date in a [`Moment`].
    pub fn to_moment(&self) -> Moment {
        Moment::new(self.to_host_date())
    }

    /// Milliseconds since the Unix epoch.
    ///
    /// Zoned values are absolute instants. Naive values are read as wall clock
    /// in `tz`, or UTC when no timezone is given.
    pub fn to_epoch_millis(&self, tz: Option<&Tz>) -> Result<i64> {
        match self {
            Temporal::DateTime(dt) => Ok(dt.timestamp_millis()),
            Temporal::Time(time, offset) => {
                let on_epoch = epoch_day().and_time(*time);
                offset
                    .from_local_datetime(&on_epoch)
                    .single()
                    .map(|instant| instant.timestamp_millis())
                    .ok_or_else(|| Neo4jTypesError::AmbiguousDateTime {
                        timezone: offset.to_string(),
                        datetime: on_epoch.to_string(),
                    })
            }
            _ => {
                let host = self.to_host_date();
                match tz {
                    Some(tz) => tz
                        .from_local_datetime(&host)
                        .single()
                        .map(|instant| instant.timestamp_millis())
                        .ok_or_else(|| Neo4jTypesError::AmbiguousDateTime {
                            timezone: tz.name().to_string(),
                            datetime: host.to_string(),
                        }),
                    None => Ok(host.and_utc().timestamp_millis()),
                }
            }
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Temporal::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f%:z")),
            Temporal::LocalDateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Temporal::Time(time, offset) => {
                write!(f, "{}{}", time.format("%H:%M:%S%.f"), offset)
            }
            Temporal::LocalTime(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
        }
    }
}

impl From<Temporal> for BoltType {
    fn from(temporal: Temporal) -> Self {
        match temporal {
            Temporal::Date(date) => BoltType::Date(BoltDate::from(date)),
            Temporal::DateTime(dt) => BoltType::DateTime(BoltDateTime::from(dt)),
            Temporal::LocalDateTime(dt) => BoltType::LocalDateTime(BoltLocalDateTime::from(dt)),
            Temporal::Time(time, offset) => BoltType::Time(BoltTime::from((time, offset))),
            Temporal::LocalTime(time) => BoltType::LocalTime(BoltLocalTime::from(time)),
        }
    }
}

/// True for Bolt temporal structures of any kind.
pub fn is_bolt_temporal(bolt: &BoltType) -> bool {
    matches!(
        bolt,
        BoltType::Date(_)
            | BoltType::DateTime(_)
            | BoltType::DateTimeZoneId(_)
            | BoltType::LocalDateTime(_)
            | BoltType::Time(_)
            | BoltType::LocalTime(_)
    )
}

/// True if `value` already is a wire temporal value.
pub fn is_temporal(value: &Value) -> bool {
    match value {
        Value::Temporal(_) => true,
        Value::Wire(bolt) => is_bolt_temporal(bolt),
        _ => false,
    }
}

/// True if `value` already is a wire integer.
pub fn is_wire_integer(value: &Value) -> bool {
    matches!(value, Value::Wire(BoltType::Integer(_)))
}
