//! Error types for Neo4j value conversions.
//!
//! Decoding and encoding return explicit errors for unexpected cases instead of
//! silently falling back to default values. Date *parsing* is the exception: it
//! accepts loosely-typed input and yields `None` when the input cannot be read.

use thiserror::Error;

/// Errors that can occur during Neo4j value conversions.
#[derive(Debug, Error)]
pub enum Neo4jTypesError {
    /// Invalid IANA timezone string.
    #[error("Invalid timezone: {0}. Use IANA timezone names like 'America/New_York', 'UTC', 'Europe/London'")]
    InvalidTimezone(String),

    /// Ambiguous or invalid datetime due to DST transition or invalid date.
    #[error("Ambiguous or invalid datetime in timezone {timezone}: {datetime}")]
    AmbiguousDateTime { timezone: String, datetime: String },

    /// Infinity float values cannot be represented in Neo4j.
    #[error("Infinity float values cannot be represented in Neo4j")]
    InfinityFloat,

    /// Invalid date value.
    #[error("Invalid date: {reason}")]
    InvalidDate { reason: String },

    /// Invalid datetime value.
    #[error("Invalid datetime: {reason}")]
    InvalidDateTime { reason: String },
}

/// Result type for Neo4j value conversions.
pub type Result<T> = std::result::Result<T, Neo4jTypesError>;
