//! In-memory driver for tests.
//!
//! [`MemoryConnector`] answers statements through a handler function and
//! records every lifecycle event (connect, session open/close, begin, run,
//! commit, rollback, driver close) so tests can assert on resource handling.
//! Statements run inside a transaction only reach [`MemoryState::committed`]
//! once the transaction commits.

use crate::config::ClientConfig;
use crate::driver::{AccessMode, Connector, Driver, Runner, Session, Transaction};
use crate::error::{Neo4jHelperError, Result};
use crate::query::Statement;
use crate::result::RawResponse;
use async_trait::async_trait;
use neo4j_types::Record;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Answers one statement.
pub type Handler = Arc<dyn Fn(&Statement) -> Result<RawResponse> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    SessionOpen,
    SessionClose,
    Begin(AccessMode),
    Run { cypher: String, in_transaction: bool },
    Commit,
    Rollback,
    DriverClose,
}

/// Everything the in-memory driver observed.
#[derive(Debug, Default)]
pub struct MemoryState {
    events: Mutex<Vec<Event>>,
    committed: Mutex<Vec<Statement>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryState {
    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        lock(&self.events).iter().filter(|e| *e == event).count()
    }

    /// Cypher of every statement run, in order.
    pub fn ran(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                Event::Run { cypher, .. } => Some(cypher.clone()),
                _ => None,
            })
            .collect()
    }

    /// Statements that took effect: auto-commit runs and committed
    /// transactions.
    pub fn committed(&self) -> Vec<Statement> {
        lock(&self.committed).clone()
    }

    fn record(&self, event: Event) {
        lock(&self.events).push(event);
    }
}

/// Echo the statement's parameters back as a single record, one field per
/// parameter sorted by name. Statements without parameters return no records.
pub fn echo_params(statement: &Statement) -> Result<RawResponse> {
    if statement.params.value.is_empty() {
        return Ok(RawResponse::default());
    }
    let mut fields: Vec<_> = statement
        .params
        .value
        .iter()
        .map(|(k, v)| (k.value.clone(), v.clone()))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(RawResponse::new(vec![fields.into_iter().collect::<Record>()]))
}

#[derive(Clone)]
pub struct MemoryConnector {
    state: Arc<MemoryState>,
    handler: Handler,
    closing_marker: Option<String>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            handler: Arc::new(echo_params),
            closing_marker: None,
        }
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Statement) -> Result<RawResponse> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Fail every statement whose Cypher contains `marker`; answer the rest
    /// with [`echo_params`].
    pub fn failing_on(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self::new().with_handler(move |statement| {
            if statement.cypher.contains(&marker) {
                Err(Neo4jHelperError::query(format!(
                    "statement rejected: {}",
                    statement.cypher
                )))
            } else {
                echo_params(statement)
            }
        })
    }

    /// Transactions close themselves, as if terminated by the server, after
    /// running a statement whose Cypher contains `marker`. Nothing is
    /// committed or rolled back.
    pub fn closing_on(mut self, marker: impl Into<String>) -> Self {
        self.closing_marker = Some(marker.into());
        self
    }

    pub fn state(&self) -> Arc<MemoryState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Driver = MemoryDriver;

    async fn connect(&self, _config: &ClientConfig) -> Result<MemoryDriver> {
        self.state.record(Event::Connect);
        Ok(MemoryDriver {
            state: Arc::clone(&self.state),
            handler: Arc::clone(&self.handler),
            closing_marker: self.closing_marker.clone(),
        })
    }
}

pub struct MemoryDriver {
    state: Arc<MemoryState>,
    handler: Handler,
    closing_marker: Option<String>,
}

#[async_trait]
impl Driver for MemoryDriver {
    type Session = MemorySession;

    async fn session(&self, _database: Option<&str>) -> Result<MemorySession> {
        self.state.record(Event::SessionOpen);
        Ok(MemorySession {
            state: Arc::clone(&self.state),
            handler: Arc::clone(&self.handler),
            closing_marker: self.closing_marker.clone(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Event::DriverClose);
        Ok(())
    }
}

pub struct MemorySession {
    state: Arc<MemoryState>,
    handler: Handler,
    closing_marker: Option<String>,
}

#[async_trait]
impl Runner for MemorySession {
    async fn run(&self, statement: Statement) -> Result<RawResponse> {
        self.state.record(Event::Run {
            cypher: statement.cypher.clone(),
            in_transaction: false,
        });
        let response = (self.handler)(&statement)?;
        lock(&self.state.committed).push(statement);
        Ok(response)
    }
}

#[async_trait]
impl Session for MemorySession {
    type Transaction = MemoryTransaction;

    async fn begin_transaction(&self, mode: AccessMode) -> Result<MemoryTransaction> {
        self.state.record(Event::Begin(mode));
        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            handler: Arc::clone(&self.handler),
            closing_marker: self.closing_marker.clone(),
            pending: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
        })
    }

    async fn close(&self) -> Result<()> {
        self.state.record(Event::SessionClose);
        Ok(())
    }
}

pub struct MemoryTransaction {
    state: Arc<MemoryState>,
    handler: Handler,
    closing_marker: Option<String>,
    pending: Mutex<Vec<Statement>>,
    open: AtomicBool,
}

impl MemoryTransaction {
    fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Neo4jHelperError::TransactionClosed)
        }
    }
}

#[async_trait]
impl Runner for MemoryTransaction {
    async fn run(&self, statement: Statement) -> Result<RawResponse> {
        if !self.is_open() {
            return Err(Neo4jHelperError::TransactionClosed);
        }
        self.state.record(Event::Run {
            cypher: statement.cypher.clone(),
            in_transaction: true,
        });
        let response = (self.handler)(&statement)?;
        let closes = self
            .closing_marker
            .as_deref()
            .is_some_and(|marker| statement.cypher.contains(marker));
        if closes {
            self.open.store(false, Ordering::SeqCst);
            lock(&self.pending).clear();
        } else {
            lock(&self.pending).push(statement);
        }
        Ok(response)
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(&self) -> Result<()> {
        self.close()?;
        self.state.record(Event::Commit);
        let pending = std::mem::take(&mut *lock(&self.pending));
        lock(&self.state.committed).extend(pending);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.close()?;
        self.state.record(Event::Rollback);
        lock(&self.pending).clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
