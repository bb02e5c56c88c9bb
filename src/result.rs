//! Result shapes returned by query execution.

use crate::error::Result;
use clap::ValueEnum;
use neo4j_types::{parse_response, DateType, Map, ParseOptions, Record, Value};
use serde::{Deserialize, Serialize};

/// What the driver returned for one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub keys: Vec<String>,
    pub records: Vec<Record>,
}

impl RawResponse {
    pub fn new(records: Vec<Record>) -> Self {
        let keys = records
            .first()
            .map(|r| r.keys().map(str::to_string).collect())
            .unwrap_or_default();
        Self { keys, records }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let records = self
            .records
            .iter()
            .map(|record| {
                serde_json::Value::Object(
                    record
                        .fields()
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::Wire(v.clone()).to_json()))
                        .collect(),
                )
            })
            .collect();
        serde_json::json!({ "keys": self.keys, "records": serde_json::Value::Array(records) })
    }
}

/// Raw response together with the options used and the parsed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub raw: RawResponse,
    pub options: RunOptions,
    pub parsed: Vec<Map>,
}

/// Shape of the value produced for each statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    /// Parsed rows only
    #[default]
    Parser,
    /// Raw response plus parsed rows
    ParserRaw,
    /// Raw response only
    Raw,
}

/// Per-call execution options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default)]
    pub return_type: ReturnType,

    #[serde(flatten)]
    pub parse: ParseOptions,

    /// Log every statement with its parameters substituted.
    #[serde(default)]
    pub debug: bool,
}

impl RunOptions {
    pub fn with_return_type(mut self, return_type: ReturnType) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn with_date_type(mut self, date_type: DateType) -> Self {
        self.parse.date_type = date_type;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.parse.timezone = Some(timezone.into());
        self
    }

    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

/// One statement's result in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Parsed(Vec<Map>),
    Full(QueryResult),
    Raw(RawResponse),
}

impl Response {
    /// Build the response for `raw`. `force_raw` overrides the requested shape.
    pub fn build(raw: RawResponse, options: &RunOptions, force_raw: bool) -> Result<Self> {
        let return_type = if force_raw {
            ReturnType::Raw
        } else {
            options.return_type
        };

        Ok(match return_type {
            ReturnType::Parser => Response::Parsed(parse_response(&raw.records, &options.parse)?),
            ReturnType::ParserRaw => {
                let parsed = parse_response(&raw.records, &options.parse)?;
                Response::Full(QueryResult {
                    raw,
                    options: options.clone(),
                    parsed,
                })
            }
            ReturnType::Raw => Response::Raw(raw),
        })
    }

    /// Parsed rows, if this shape carries them.
    pub fn rows(&self) -> Option<&[Map]> {
        match self {
            Response::Parsed(rows) => Some(rows),
            Response::Full(result) => Some(&result.parsed),
            Response::Raw(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let rows_json = |rows: &[Map]| {
            serde_json::Value::Array(rows.iter().map(|r| Value::Map(r.clone()).to_json()).collect())
        };
        match self {
            Response::Parsed(rows) => rows_json(rows),
            Response::Full(result) => serde_json::json!({
                "raw": result.raw.to_json(),
                "parsed": rows_json(&result.parsed),
            }),
            Response::Raw(raw) => raw.to_json(),
        }
    }
}

/// Zero, one or many results, following the size of the submitted batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Empty,
    Single(T),
    Many(Vec<T>),
}

impl<T> Outcome<T> {
    pub fn from_vec(mut items: Vec<T>) -> Self {
        match items.len() {
            0 => Outcome::Empty,
            1 => match items.pop() {
                Some(item) => Outcome::Single(item),
                None => Outcome::Empty,
            },
            _ => Outcome::Many(items),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Outcome::Empty => Vec::new(),
            Outcome::Single(item) => vec![item],
            Outcome::Many(items) => items,
        }
    }

    /// The single result, or the first of many.
    pub fn leading(&self) -> Option<&T> {
        match self {
            Outcome::Empty => None,
            Outcome::Single(item) => Some(item),
            Outcome::Many(items) => items.first(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Outcome::Empty => 0,
            Outcome::Single(_) => 1,
            Outcome::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }
}

impl Outcome<Response> {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Outcome::Empty => serde_json::Value::Null,
            Outcome::Single(response) => response.to_json(),
            Outcome::Many(responses) => {
                serde_json::Value::Array(responses.iter().map(Response::to_json).collect())
            }
        }
    }
}
