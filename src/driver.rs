//! The seam between the client and a Neo4j driver implementation.
//!
//! The client only talks to these traits. [`crate::neo4j`] implements them on
//! top of `neo4rs`; [`crate::testing`] implements them in memory.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::query::Statement;
use crate::result::RawResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Requested access mode for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    #[default]
    Write,
}

/// Creates drivers from configuration.
#[async_trait]
pub trait Connector: Send + Sync {
    type Driver: Driver;

    async fn connect(&self, config: &ClientConfig) -> Result<Self::Driver>;
}

/// A connected driver handing out sessions.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Session: Session;

    async fn session(&self, database: Option<&str>) -> Result<Self::Session>;

    async fn close(&self) -> Result<()>;
}

/// Anything that can run a statement: sessions and transactions.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, statement: Statement) -> Result<RawResponse>;
}

#[async_trait]
pub trait Session: Runner + 'static {
    type Transaction: Transaction;

    async fn begin_transaction(&self, mode: AccessMode) -> Result<Self::Transaction>;

    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait Transaction: Runner + 'static {
    async fn commit(&self) -> Result<()>;

    async fn rollback(&self) -> Result<()>;

    /// False once committed or rolled back.
    fn is_open(&self) -> bool;
}
