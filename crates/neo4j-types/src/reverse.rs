//! Reverse conversion: Neo4j records → host `Value` maps.
//!
//! Each record is flattened into one map keyed by the last segment of every
//! field name, so `n.name` and `name` both land under `"name"`. When two
//! fields share a last segment the later one wins.
//!
//! ## Graph structures
//!
//! Nodes and relationships are replaced by their property maps. Paths become
//! `{nodes, relationships}` lists of property maps. Points become
//! `{srid, x, y[, z]}` and durations become `{seconds, nanoseconds}`.
//!
//! ## Dates
//!
//! Temporal values are converted according to [`DateType`]. The optional
//! timezone shifts zoned values and anchors naive ones when producing
//! timestamps.

use crate::error::{Neo4jTypesError, Result};
use crate::temporal::Temporal;
use crate::value::{Map, Value};
use chrono_tz::Tz;
use neo4rs::BoltType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How temporal values are represented in parsed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    #[default]
    Moment,
    Native,
    Timestamp,
    /// Leave the wire temporal untouched. Unrecognised names land here too.
    #[serde(other)]
    Raw,
}

impl FromStr for DateType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "moment" => DateType::Moment,
            "native" => DateType::Native,
            "timestamp" => DateType::Timestamp,
            _ => DateType::Raw,
        })
    }
}

/// Options for [`parse_response`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOptions {
    #[serde(default)]
    pub date_type: DateType,

    /// IANA timezone name. `None` keeps zoned values on their own wall clock
    /// and reads naive values as UTC.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ParseOptions {
    pub fn with_date_type(date_type: DateType) -> Self {
        Self {
            date_type,
            ..Default::default()
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    fn parse_timezone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                Tz::from_str(name).map_err(|_| Neo4jTypesError::InvalidTimezone(name.to_string()))
            })
            .transpose()
    }
}

/// One row returned by a query: field names paired with wire values, in
/// column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, BoltType)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<BoltType>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<BoltType>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&BoltType> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, BoltType)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, BoltType)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, BoltType)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Output key for a field name: the part after the last dot.
pub fn field_name(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

/// Parse raw records into flat host maps, one per record.
///
/// Only the first record is probed for structure: if there are no records or
/// the first one has no fields the result is empty.
///
/// # Errors
///
/// Returns an error for an invalid timezone or a temporal value that cannot
/// be decoded.
pub fn parse_response(records: &[Record], options: &ParseOptions) -> Result<Vec<Map>> {
    match records.first() {
        None => return Ok(Vec::new()),
        Some(first) if first.is_empty() => return Ok(Vec::new()),
        Some(_) => {}
    }

    let timezone = options.parse_timezone()?;
    let converter = Converter {
        date_type: options.date_type,
        timezone: timezone.as_ref(),
    };

    records
        .iter()
        .map(|record| {
            let mut parsed = Map::new();
            for (key, value) in record.fields() {
                parsed.insert(field_name(key).to_string(), converter.convert(value)?);
            }
            Ok(parsed)
        })
        .collect()
}

/// Convert a single Bolt value into a host value.
pub fn convert_bolt_to_value(bolt: &BoltType, options: &ParseOptions) -> Result<Value> {
    let timezone = options.parse_timezone()?;
    Converter {
        date_type: options.date_type,
        timezone: timezone.as_ref(),
    }
    .convert(bolt)
}

struct Converter<'a> {
    date_type: DateType,
    timezone: Option<&'a Tz>,
}

impl Converter<'_> {
    fn convert(&self, bolt: &BoltType) -> Result<Value> {
        if let Some(temporal) = Temporal::from_bolt(bolt) {
            return self.convert_temporal(temporal?, bolt);
        }

        match bolt {
            BoltType::Null(_) => Ok(Value::Null),
            BoltType::Boolean(b) => Ok(Value::Bool(b.value)),
            BoltType::Integer(i) => Ok(Value::Integer(i.value)),
            BoltType::Float(f) => Ok(Value::Float(f.value)),
            BoltType::String(s) => Ok(Value::String(s.value.clone())),
            BoltType::Bytes(b) => Ok(Value::Bytes(b.value.to_vec())),
            BoltType::List(list) => list
                .value
                .iter()
                .map(|item| self.convert(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            BoltType::Map(map) => self.convert_map(map),
            BoltType::Node(node) => self.convert_map(&node.properties),
            BoltType::Relation(rel) => self.convert_map(&rel.properties),
            BoltType::UnboundedRelation(rel) => self.convert_map(&rel.properties),
            BoltType::Path(path) => {
                let nodes = path
                    .nodes
                    .value
                    .iter()
                    .map(|node| self.convert(node))
                    .collect::<Result<Vec<_>>>()?;
                let relationships = path
                    .rels
                    .value
                    .iter()
                    .map(|rel| self.convert(rel))
                    .collect::<Result<Vec<_>>>()?;

                let mut out = Map::new();
                out.insert("nodes".to_string(), Value::List(nodes));
                out.insert("relationships".to_string(), Value::List(relationships));
                Ok(Value::Map(out))
            }
            BoltType::Point2D(point) => {
                let mut out = Map::new();
                out.insert("srid".to_string(), Value::Integer(point.sr_id.value));
                out.insert("x".to_string(), Value::Float(point.x.value));
                out.insert("y".to_string(), Value::Float(point.y.value));
                Ok(Value::Map(out))
            }
            BoltType::Point3D(point) => {
                let mut out = Map::new();
                out.insert("srid".to_string(), Value::Integer(point.sr_id.value));
                out.insert("x".to_string(), Value::Float(point.x.value));
                out.insert("y".to_string(), Value::Float(point.y.value));
                out.insert("z".to_string(), Value::Float(point.z.value));
                Ok(Value::Map(out))
            }
            BoltType::Duration(duration) => {
                let std_duration: std::time::Duration = duration.clone().into();
                let mut out = Map::new();
                out.insert(
                    "seconds".to_string(),
                    Value::Integer(std_duration.as_secs() as i64),
                );
                out.insert(
                    "nanoseconds".to_string(),
                    Value::Integer(std_duration.subsec_nanos() as i64),
                );
                Ok(Value::Map(out))
            }
            other => Ok(Value::Wire(other.clone())),
        }
    }

    fn convert_map(&self, map: &neo4rs::BoltMap) -> Result<Value> {
        let mut out = Map::new();
        for (key, value) in &map.value {
            out.insert(key.value.clone(), self.convert(value)?);
        }
        Ok(Value::Map(out))
    }

    fn convert_temporal(&self, temporal: Temporal, bolt: &BoltType) -> Result<Value> {
        let host = || match self.timezone {
            Some(tz) => temporal.to_host_date_in(tz),
            None => temporal.to_host_date(),
        };

        Ok(match self.date_type {
            DateType::Moment => Value::Moment(host().into()),
            DateType::Native => Value::Date(host()),
            DateType::Timestamp => Value::Integer(temporal.to_epoch_millis(self.timezone)?),
            DateType::Raw => match bolt {
                // Zone ids have no adapter variant; keep the wire value as sent
                BoltType::DateTimeZoneId(_) => Value::Wire(bolt.clone()),
                _ => Value::Temporal(temporal),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moment::Moment;
    use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use neo4rs::{BoltFloat, BoltInteger, BoltList, BoltMap, BoltNode, BoltNull, BoltString};

    fn string(s: &str) -> BoltType {
        BoltType::String(BoltString::new(s))
    }

    fn int(i: i64) -> BoltType {
        BoltType::Integer(BoltInteger::new(i))
    }

    fn sample_datetime() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 45)
            .unwrap()
    }

    fn parse_one(record: Record, options: &ParseOptions) -> Map {
        let mut parsed = parse_response(&[record], options).unwrap();
        assert_eq!(parsed.len(), 1);
        parsed.remove(0)
    }

    #[test]
    fn test_empty_records() {
        assert!(parse_response(&[], &ParseOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_first_record_without_fields() {
        let records = vec![Record::new(), Record::new().with("a", int(1))];
        assert!(parse_response(&records, &ParseOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_qualified_names_are_flattened() {
        let record = Record::new().with("p.name", string("Ana")).with("p.age", int(30));
        let parsed = parse_one(record, &ParseOptions::default());

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["name"], Value::String("Ana".to_string()));
        assert_eq!(parsed["age"], Value::Integer(30));
    }

    #[test]
    fn test_name_collision_last_write_wins() {
        let record = Record::new().with("a.name", string("first")).with("b.name", string("second"));
        let parsed = parse_one(record, &ParseOptions::default());
        assert_eq!(parsed["name"], Value::String("second".to_string()));
    }

    #[test]
    fn test_node_is_replaced_by_properties() {
        let mut props = BoltMap::new();
        props.put(BoltString::new("city"), string("SP"));
        let node = BoltType::Node(BoltNode {
            id: BoltInteger::new(1),
            labels: BoltList::new(),
            properties: props,
        });

        let parsed = parse_one(Record::new().with("address", node), &ParseOptions::default());

        let mut expected = Map::new();
        expected.insert("city".to_string(), Value::String("SP".to_string()));
        assert_eq!(parsed["address"], Value::Map(expected));
    }

    #[test]
    fn test_nested_list_and_map() {
        let mut inner = BoltMap::new();
        inner.put(BoltString::new("score"), BoltType::Float(BoltFloat::new(9.5)));
        inner.put(BoltString::new("missing"), BoltType::Null(BoltNull));

        let mut list = BoltList::new();
        list.push(int(1));
        list.push(BoltType::Map(inner));

        let parsed = parse_one(
            Record::new().with("items", BoltType::List(list)),
            &ParseOptions::default(),
        );

        let items = parsed["items"].as_list().unwrap();
        assert_eq!(items[0], Value::Integer(1));
        assert_eq!(items[1].get("score"), Some(&Value::Float(9.5)));
        assert_eq!(items[1].get("missing"), Some(&Value::Null));
    }

    #[test]
    fn test_dates_as_moment_by_default() {
        let bolt: BoltType = Temporal::LocalDateTime(sample_datetime()).into();
        let parsed = parse_one(Record::new().with("created", bolt), &ParseOptions::default());
        assert_eq!(parsed["created"], Value::Moment(Moment::new(sample_datetime())));
    }

    #[test]
    fn test_dates_as_native() {
        let bolt: BoltType = Temporal::Date(sample_datetime().date()).into();
        let options = ParseOptions::with_date_type(DateType::Native);
        let parsed = parse_one(Record::new().with("d", bolt), &options);
        assert_eq!(
            parsed["d"],
            Value::Date(sample_datetime().date().and_time(NaiveTime::MIN))
        );
    }

    #[test]
    fn test_dates_as_timestamp() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        let bolt: BoltType = Temporal::Date(epoch).into();
        let options = ParseOptions::with_date_type(DateType::Timestamp);
        let parsed = parse_one(Record::new().with("d", bolt), &options);
        assert_eq!(parsed["d"], Value::Integer(86_400_000));
    }

    #[test]
    fn test_dates_raw_are_untouched() {
        let temporal = Temporal::LocalDateTime(sample_datetime());
        let options = ParseOptions::with_date_type(DateType::Raw);
        let parsed = parse_one(Record::new().with("d", BoltType::from(temporal)), &options);
        assert_eq!(parsed["d"], Value::Temporal(temporal));
    }

    #[test]
    fn test_zoned_datetime_shifted_into_timezone() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let dt = offset.from_local_datetime(&sample_datetime()).unwrap();
        let bolt: BoltType = Temporal::DateTime(dt).into();

        let options = ParseOptions::with_date_type(DateType::Native).with_timezone("UTC");
        let parsed = parse_one(Record::new().with("d", bolt.clone()), &options);
        assert_eq!(
            parsed["d"],
            Value::Date(sample_datetime() - chrono::TimeDelta::hours(3))
        );

        let own_clock = parse_one(
            Record::new().with("d", bolt),
            &ParseOptions::with_date_type(DateType::Native),
        );
        assert_eq!(own_clock["d"], Value::Date(sample_datetime()));
    }

    #[test]
    fn test_invalid_timezone_is_error() {
        let options = ParseOptions::default().with_timezone("Mars/Olympus");
        let result = parse_response(&[Record::new().with("a", int(1))], &options);
        assert!(matches!(result, Err(Neo4jTypesError::InvalidTimezone(_))));
    }

    #[test]
    fn test_raw_response_is_not_modified() {
        let records = vec![Record::new().with("n.name", string("Ana"))];
        let before = records.clone();
        parse_response(&records, &ParseOptions::default()).unwrap();
        assert_eq!(records, before);
    }

    #[test]
    fn test_field_name() {
        assert_eq!(field_name("n.name"), "name");
        assert_eq!(field_name("a.b.c"), "c");
        assert_eq!(field_name("plain"), "plain");
        assert_eq!(field_name("trailing."), "");
    }

    #[test]
    fn test_date_type_names() {
        assert_eq!("Native".parse::<DateType>().unwrap(), DateType::Native);
        assert_eq!("timestamp".parse::<DateType>().unwrap(), DateType::Timestamp);
        assert_eq!("whatever".parse::<DateType>().unwrap(), DateType::Raw);

        let parsed: DateType = serde_json::from_str("\"unknown_kind\"").unwrap();
        assert_eq!(parsed, DateType::Raw);
    }
}
