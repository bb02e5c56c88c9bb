//! Shortcuts over execution results.
//!
//! All helpers look at the leading response of an outcome: the single
//! response, or the first of many. Raw responses carry no parsed rows, so the
//! helpers yield nothing for them.

use crate::error::Result;
use crate::result::{Outcome, Response};
use neo4j_types::{Map, Value};

/// Parsed rows of the leading response.
pub fn rows(outcome: &Outcome<Response>) -> Option<&[Map]> {
    outcome.leading().and_then(Response::rows)
}

/// First row of the leading response.
pub fn first(outcome: &Outcome<Response>) -> Option<&Map> {
    rows(outcome).and_then(|rows| rows.first())
}

/// One field of the first row.
pub fn first_field<'a>(outcome: &'a Outcome<Response>, field: &str) -> Option<&'a Value> {
    first(outcome).and_then(|row| row.get(field))
}

/// Apply `selector` to the first row.
pub fn first_with<T>(outcome: &Outcome<Response>, selector: impl FnOnce(&Map) -> T) -> Option<T> {
    first(outcome).map(selector)
}

/// Apply `f` to every row of the leading response.
pub fn map_rows<T>(outcome: &Outcome<Response>, f: impl FnMut(&Map) -> T) -> Vec<T> {
    rows(outcome)
        .map(|rows| rows.iter().map(f).collect())
        .unwrap_or_default()
}

/// Chain the helpers directly onto an awaited call:
/// `client.execute(q, opts).await.first_field("name")?`.
pub trait ResultChain {
    fn first(self) -> Result<Option<Map>>;
    fn first_field(self, field: &str) -> Result<Option<Value>>;
    fn map_rows<T>(self, f: impl FnMut(&Map) -> T) -> Result<Vec<T>>;
}

impl ResultChain for Result<Outcome<Response>> {
    fn first(self) -> Result<Option<Map>> {
        self.map(|outcome| first(&outcome).cloned())
    }

    fn first_field(self, field: &str) -> Result<Option<Value>> {
        self.map(|outcome| first_field(&outcome, field).cloned())
    }

    fn map_rows<T>(self, f: impl FnMut(&Map) -> T) -> Result<Vec<T>> {
        self.map(|outcome| map_rows(&outcome, f))
    }
}
