//! Host-side value tree.
//!
//! `Value` is what callers build query parameters from and what parsed records
//! are made of. Besides plain scalars and containers it can carry date values
//! in the three host representations (`Temporal`, `Moment`, `Date`) and
//! already-encoded wire values (`Wire`) that must be sent untouched.

use crate::forward::cypher_literal;
use crate::moment::Moment;
use crate::temporal::Temporal;
use chrono::NaiveDateTime;
use neo4rs::BoltType;
use std::collections::BTreeMap;

/// Mapping of field or parameter names to values.
pub type Map = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(Map),
    /// Wire temporal value, kept as-is.
    Temporal(Temporal),
    Moment(Moment),
    /// Native calendar date-time.
    Date(NaiveDateTime),
    /// Wire value passed through without conversion.
    Wire(BoltType),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Render as JSON. Dates become ISO-8601 strings and bytes become hex.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::json!(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Temporal(t) => serde_json::Value::String(t.to_string()),
            Value::Moment(m) => {
                if m.is_valid() {
                    serde_json::Value::String(m.to_string())
                } else {
                    serde_json::Value::Null
                }
            }
            Value::Date(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
            }
            Value::Wire(bolt) => wire_to_json(bolt),
        }
    }
}

/// JSON for an untouched wire value. Scalars and collections keep their JSON
/// type; temporals become ISO-8601 strings; anything else (graph elements,
/// points, durations) falls back to its Cypher literal.
fn wire_to_json(bolt: &BoltType) -> serde_json::Value {
    if let Some(Ok(temporal)) = Temporal::from_bolt(bolt) {
        return serde_json::Value::String(temporal.to_string());
    }
    match bolt {
        BoltType::Null(_) => serde_json::Value::Null,
        BoltType::Boolean(b) => serde_json::Value::Bool(b.value),
        BoltType::Integer(i) => serde_json::json!(i.value),
        BoltType::Float(f) => serde_json::Number::from_f64(f.value)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        BoltType::String(s) => serde_json::Value::String(s.value.clone()),
        BoltType::Bytes(b) => serde_json::Value::String(hex::encode(&b.value)),
        BoltType::List(list) => {
            serde_json::Value::Array(list.value.iter().map(wire_to_json).collect())
        }
        BoltType::Map(map) => serde_json::Value::Object(
            map.value
                .iter()
                .map(|(k, v)| (k.value.clone(), wire_to_json(v)))
                .collect(),
        ),
        other => serde_json::Value::String(cypher_literal(other)),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Temporal> for Value {
    fn from(t: Temporal) -> Self {
        Value::Temporal(t)
    }
}

impl From<Moment> for Value {
    fn from(m: Moment) -> Self {
        Value::Moment(m)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(dt)
    }
}

impl From<BoltType> for Value {
    fn from(bolt: BoltType) -> Self {
        Value::Wire(bolt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
