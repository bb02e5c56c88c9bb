//! Forward conversion: host `Value` → Neo4j Bolt wire values and Cypher literals.
//!
//! Parameter normalization builds a new `BoltMap` from the caller's parameters;
//! the input is never modified. Values that already are wire temporals or wire
//! integers are passed through without being re-encoded.

use crate::error::{Neo4jTypesError, Result};
use crate::temporal::{is_temporal, is_wire_integer, Temporal};
use crate::value::{Map, Value};
use neo4rs::{
    BoltBoolean, BoltBytes, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString,
    BoltType,
};

/// Normalize a parameter map for dispatch.
pub fn normalize_params(params: &Map) -> Result<BoltMap> {
    let mut normalized = BoltMap::new();
    for (key, value) in params {
        normalized.put(BoltString::new(key), normalize_value(value)?);
    }
    Ok(normalized)
}

/// Normalize a single value.
///
/// # Errors
///
/// Returns an error for infinite floats, which Neo4j cannot store.
pub fn normalize_value(value: &Value) -> Result<BoltType> {
    if let Value::Wire(bolt) = value {
        if is_temporal(value) || is_wire_integer(value) {
            return Ok(bolt.clone());
        }
    }

    match value {
        Value::Null => Ok(BoltType::Null(BoltNull)),
        Value::Bool(b) => Ok(BoltType::Boolean(BoltBoolean::new(*b))),
        Value::Integer(i) => Ok(BoltType::Integer(BoltInteger::new(*i))),
        Value::Float(f) => {
            if f.is_nan() {
                Ok(BoltType::Null(BoltNull))
            } else if f.is_infinite() {
                Err(Neo4jTypesError::InfinityFloat)
            } else {
                Ok(BoltType::Float(BoltFloat::new(*f)))
            }
        }
        Value::String(s) => Ok(BoltType::String(BoltString::new(s))),
        Value::Bytes(b) => Ok(BoltType::Bytes(BoltBytes::new(b.clone().into()))),
        Value::List(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(normalize_value(item)?);
            }
            Ok(BoltType::List(list))
        }
        Value::Map(map) => Ok(BoltType::Map(normalize_params(map)?)),
        Value::Moment(m) => Ok(match m.to_date() {
            Some(dt) => Temporal::LocalDateTime(dt).into(),
            None => BoltType::Null(BoltNull),
        }),
        Value::Date(dt) => Ok(Temporal::LocalDateTime(*dt).into()),
        // Points, durations and other wire structures go out as given
        Value::Wire(bolt) => Ok(bolt.clone()),
        Value::Temporal(t) => Ok(BoltType::from(*t)),
    }
}

/// Render a Bolt value as a Cypher literal.
///
/// Map keys are sorted so the output is deterministic.
pub fn cypher_literal(value: &BoltType) -> String {
    if let Some(Ok(temporal)) = Temporal::from_bolt(value) {
        return format!("{}('{}')", temporal.kind().cypher_function(), temporal);
    }

    match value {
        BoltType::Null(_) => "null".to_string(),
        BoltType::Boolean(b) => b.value.to_string(),
        BoltType::Integer(i) => i.value.to_string(),
        BoltType::Float(f) => {
            if f.value.is_nan() {
                "NaN".to_string()
            } else if f.value.is_infinite() {
                if f.value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
            } else {
                format!("{:?}", f.value)
            }
        }
        BoltType::String(s) => escape_neo4j_string(&s.value),
        BoltType::Bytes(b) => escape_neo4j_string(&hex::encode(&b.value)),
        BoltType::List(list) => {
            let items: Vec<String> = list.value.iter().map(cypher_literal).collect();
            format!("[{}]", items.join(", "))
        }
        BoltType::Map(map) => bolt_map_literal(map),
        BoltType::Duration(duration) => {
            let std_duration: std::time::Duration = duration.clone().into();
            let secs = std_duration.as_secs();
            let nanos = std_duration.subsec_nanos();
            if nanos == 0 {
                format!("duration('PT{secs}S')")
            } else {
                format!("duration('PT{secs}.{nanos:09}S')")
            }
        }
        BoltType::Point2D(point) => format!(
            "point({{srid: {}, x: {:?}, y: {:?}}})",
            point.sr_id.value, point.x.value, point.y.value
        ),
        BoltType::Point3D(point) => format!(
            "point({{srid: {}, x: {:?}, y: {:?}, z: {:?}}})",
            point.sr_id.value, point.x.value, point.y.value, point.z.value
        ),
        other => format!("{other:?}"),
    }
}

fn bolt_map_literal(map: &BoltMap) -> String {
    let mut entries: Vec<(&str, String)> = map
        .value
        .iter()
        .map(|(k, v)| (k.value.as_str(), cypher_literal(v)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let entries: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}: {v}", escape_identifier(k)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Render one or more host maps, merged left to right, as a Cypher map
/// literal. Returns an empty string when every map is empty.
pub fn cypher_map_literal(maps: &[&Map]) -> Result<String> {
    let mut merged = Map::new();
    for map in maps {
        merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if merged.is_empty() {
        return Ok(String::new());
    }
    Ok(bolt_map_literal(&normalize_params(&merged)?))
}

/// Substitute `$name` placeholders in `cypher` with the literal of the
/// matching parameter. Unknown placeholders are left in place.
pub fn cypher_replace_params(cypher: &str, params: &BoltMap) -> String {
    let mut out = String::with_capacity(cypher.len());
    let mut chars = cypher.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let mut end = start + 1;
        while let Some(&(idx, next)) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                end = idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let name = &cypher[start + 1..end];
        match params.value.get(&BoltString::new(name)) {
            Some(value) if !name.is_empty() => out.push_str(&cypher_literal(value)),
            _ => out.push_str(&cypher[start..end]),
        }
    }

    out
}

fn escape_identifier(name: &str) -> String {
    if !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
    {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

/// Escape a string for Neo4j Cypher.
///
/// Handles single quotes, double quotes, backslashes, and control characters.
pub fn escape_neo4j_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t");
    format!("'{escaped}'")
}
