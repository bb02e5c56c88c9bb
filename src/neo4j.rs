//! `neo4rs` implementation of the driver traits.
//!
//! A `neo4rs::Graph` is already a connection pool, so the driver is a thin
//! wrapper around one and sessions are cheap clones of it.
//!
//! `neo4rs` rows do not expose their column order; record fields are sorted
//! by name.

use crate::config::ClientConfig;
use crate::driver::{AccessMode, Connector, Driver, Runner, Session, Transaction};
use crate::error::{Neo4jHelperError, Result};
use crate::query::Statement;
use crate::result::RawResponse;
use async_trait::async_trait;
use neo4j_types::Record;
use neo4rs::{BoltType, ConfigBuilder, Graph, Query, Row, Txn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Connects `neo4rs` graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neo4rsConnector;

#[async_trait]
impl Connector for Neo4rsConnector {
    type Driver = Neo4rsDriver;

    async fn connect(&self, config: &ClientConfig) -> Result<Neo4rsDriver> {
        if config.url.is_empty() {
            return Err(Neo4jHelperError::Config(
                "Neo4j url must be set, e.g. bolt://localhost:7687".to_string(),
            ));
        }

        debug!("Connecting to Neo4j at: {}", config.url);
        let mut builder = ConfigBuilder::default()
            .uri(&config.url)
            .user(&config.username)
            .password(&config.password);
        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }
        if let Some(fetch_size) = config.driver_config.fetch_size {
            builder = builder.fetch_size(fetch_size);
        }
        if let Some(max_connections) = config.driver_config.max_connections {
            builder = builder.max_connections(max_connections);
        }

        let neo4rs_config = builder
            .build()
            .map_err(|e| Neo4jHelperError::Config(e.to_string()))?;
        let graph =
            Graph::connect(neo4rs_config).map_err(|e| Neo4jHelperError::Connection(e.to_string()))?;
        debug!("Neo4j connection established");

        Ok(Neo4rsDriver {
            graph,
            database: config.database.clone(),
        })
    }
}

pub struct Neo4rsDriver {
    graph: Graph,
    database: Option<String>,
}

#[async_trait]
impl Driver for Neo4rsDriver {
    type Session = Neo4rsSession;

    async fn session(&self, database: Option<&str>) -> Result<Neo4rsSession> {
        if database.is_some() && database != self.database.as_deref() {
            debug!(
                "Session database {:?} differs from the connected database {:?}; using the connected one",
                database, self.database
            );
        }
        Ok(Neo4rsSession {
            graph: self.graph.clone(),
        })
    }

    async fn close(&self) -> Result<()> {
        // Pooled connections are released when the last graph clone drops
        debug!("Neo4j driver closed");
        Ok(())
    }
}

pub struct Neo4rsSession {
    graph: Graph,
}

#[async_trait]
impl Runner for Neo4rsSession {
    async fn run(&self, statement: Statement) -> Result<RawResponse> {
        let mut result = self.graph.execute(to_query(statement)).await?;
        let mut records = Vec::new();
        while let Some(row) = result.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(RawResponse::new(records))
    }
}

#[async_trait]
impl Session for Neo4rsSession {
    type Transaction = Neo4rsTransaction;

    async fn begin_transaction(&self, mode: AccessMode) -> Result<Neo4rsTransaction> {
        debug!("Starting {mode:?} transaction");
        let txn = self.graph.start_txn().await?;
        Ok(Neo4rsTransaction {
            txn: Mutex::new(Some(txn)),
            open: AtomicBool::new(true),
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A `neo4rs` transaction. Statements are serialized on the inner `Txn`.
pub struct Neo4rsTransaction {
    txn: Mutex<Option<Txn>>,
    open: AtomicBool,
}

impl Neo4rsTransaction {
    async fn take(&self) -> Result<Txn> {
        let txn = self
            .txn
            .lock()
            .await
            .take()
            .ok_or(Neo4jHelperError::TransactionClosed)?;
        self.open.store(false, Ordering::SeqCst);
        Ok(txn)
    }
}

#[async_trait]
impl Runner for Neo4rsTransaction {
    async fn run(&self, statement: Statement) -> Result<RawResponse> {
        let mut guard = self.txn.lock().await;
        let txn = guard.as_mut().ok_or(Neo4jHelperError::TransactionClosed)?;

        let mut result = txn.execute(to_query(statement)).await?;
        let mut records = Vec::new();
        while let Some(row) = result.next(txn.handle()).await? {
            records.push(row_to_record(&row)?);
        }
        Ok(RawResponse::new(records))
    }
}

#[async_trait]
impl Transaction for Neo4rsTransaction {
    async fn commit(&self) -> Result<()> {
        self.take().await?.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.take().await?.rollback().await?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

fn to_query(statement: Statement) -> Query {
    let mut query = Query::new(statement.cypher);
    for (key, value) in statement.params.value {
        query = query.param(&key.value, value);
    }
    query
}

fn row_to_record(row: &Row) -> Result<Record> {
    let mut fields: Vec<(String, BoltType)> = row
        .to::<HashMap<String, BoltType>>()?
        .into_iter()
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(fields.into_iter().collect())
}
