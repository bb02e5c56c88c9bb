//! Error types for the neo4j-helper client.

use thiserror::Error;

/// Errors that can occur while running queries through the client.
#[derive(Error, Debug)]
pub enum Neo4jHelperError {
    /// Neo4j driver error (connectivity, authentication, query failures)
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    /// A returned row could not be read
    #[error("Neo4j row error: {0}")]
    Row(#[from] neo4rs::DeError),

    /// Parameter normalization or record parsing failed
    #[error("Conversion error: {0}")]
    Conversion(#[from] neo4j_types::Neo4jTypesError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The transaction was already committed or rolled back
    #[error("Transaction is no longer open")]
    TransactionClosed,

    /// A query was rejected, or a transaction block failed
    #[error("Query failed: {0}")]
    Query(String),
}

impl Neo4jHelperError {
    pub fn query(message: impl Into<String>) -> Self {
        Neo4jHelperError::Query(message.into())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Neo4jHelperError>;
