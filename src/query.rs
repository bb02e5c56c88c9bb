//! Query specifications and normalized statements.

use crate::error::Result;
use neo4j_types::{normalize_params, Map, Value};
use neo4rs::BoltMap;

/// A Cypher query with optional parameters, as written by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub cypher: String,
    pub params: Map,
}

impl QuerySpec {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: Map::new(),
        }
    }

    pub fn with_params(cypher: impl Into<String>, params: Map) -> Self {
        Self {
            cypher: cypher.into(),
            params,
        }
    }

    /// Add one parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for QuerySpec {
    fn from(cypher: &str) -> Self {
        QuerySpec::new(cypher)
    }
}

impl From<String> for QuerySpec {
    fn from(cypher: String) -> Self {
        QuerySpec::new(cypher)
    }
}

impl<S: Into<String>> From<(S, Map)> for QuerySpec {
    fn from((cypher, params): (S, Map)) -> Self {
        QuerySpec::with_params(cypher, params)
    }
}

/// An ordered sequence of queries submitted together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch(Vec<QuerySpec>);

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spec: impl Into<QuerySpec>) {
        self.0.push(spec.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuerySpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&QuerySpec> {
        self.0.last()
    }

    pub fn into_inner(self) -> Vec<QuerySpec> {
        self.0
    }
}

impl From<QuerySpec> for Batch {
    fn from(spec: QuerySpec) -> Self {
        Batch(vec![spec])
    }
}

impl From<&str> for Batch {
    fn from(cypher: &str) -> Self {
        Batch(vec![cypher.into()])
    }
}

impl From<String> for Batch {
    fn from(cypher: String) -> Self {
        Batch(vec![cypher.into()])
    }
}

impl<T: Into<QuerySpec>> From<Vec<T>> for Batch {
    fn from(specs: Vec<T>) -> Self {
        specs.into_iter().collect()
    }
}

impl<T: Into<QuerySpec>> FromIterator<T> for Batch {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Batch(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a QuerySpec;
    type IntoIter = std::slice::Iter<'a, QuerySpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A query ready for dispatch: Cypher text plus wire parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: BoltMap,
}

impl Statement {
    /// Normalize a query spec. The spec itself is left untouched.
    pub fn from_spec(spec: &QuerySpec) -> Result<Self> {
        Ok(Self {
            cypher: spec.cypher.clone(),
            params: normalize_params(&spec.params)?,
        })
    }
}
