//! The query orchestrator.
//!
//! [`Neo4jHelper`] owns a connector and a configuration. Each call acquires a
//! driver (the shared one, or a fresh one when `auto_close_driver` is set),
//! opens a session, runs its queries and releases everything again, on the
//! error path too.

use crate::config::{ClientConfig, ClientOptions};
use crate::driver::{AccessMode, Connector, Driver, Runner, Session, Transaction};
use crate::error::{Neo4jHelperError, Result};
use crate::neo4j::Neo4rsConnector;
use crate::query::{Batch, Statement};
use crate::result::{Outcome, Response, RunOptions};
use crate::transaction::TxExecutor;
use futures::future::try_join_all;
use neo4j_types::cypher_replace_params;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Callback invoked with every error before it is returned, together with the
/// batch that caused it when known.
pub type ErrorHandler = Arc<dyn Fn(&Neo4jHelperError, Option<&Batch>) + Send + Sync>;

/// Transaction type produced by a connector's sessions.
pub type ClientTransaction<C> =
    <<<C as Connector>::Driver as Driver>::Session as Session>::Transaction;

/// Normalize and run a batch on `runner`, issuing all statements concurrently.
///
/// Results keep the input order: no queries give [`Outcome::Empty`], one gives
/// [`Outcome::Single`], more give [`Outcome::Many`].
pub(crate) async fn run_batch<R: Runner + ?Sized>(
    runner: &R,
    batch: &Batch,
    options: &RunOptions,
    force_raw: bool,
) -> Result<Outcome<Response>> {
    let statements = batch
        .iter()
        .map(Statement::from_spec)
        .collect::<Result<Vec<_>>>()?;

    if options.debug {
        for statement in &statements {
            info!(
                "Running: {}",
                cypher_replace_params(&statement.cypher, &statement.params)
            );
        }
    }

    let raws = try_join_all(statements.into_iter().map(|s| runner.run(s))).await?;
    let responses = raws
        .into_iter()
        .map(|raw| Response::build(raw, options, force_raw))
        .collect::<Result<Vec<_>>>()?;

    Ok(Outcome::from_vec(responses))
}

pub struct Neo4jHelper<C: Connector = Neo4rsConnector> {
    connector: C,
    config: ClientConfig,
    driver: OnceCell<Arc<C::Driver>>,
    notify_error: ErrorHandler,
}

impl Neo4jHelper<Neo4rsConnector> {
    /// Create a client backed by `neo4rs`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(Neo4rsConnector, config)
    }
}

impl<C: Connector> Neo4jHelper<C> {
    pub fn with_connector(connector: C, config: ClientConfig) -> Self {
        Self {
            connector,
            config,
            driver: OnceCell::new(),
            notify_error: Arc::new(|_, _| {}),
        }
    }

    /// Set the callback notified of every failed call.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Neo4jHelperError, Option<&Batch>) + Send + Sync + 'static,
    {
        self.notify_error = Arc::new(handler);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Update part of the configuration. A shared driver connected with the
    /// old settings is closed and will be recreated on next use.
    pub async fn update_options(&mut self, options: ClientOptions) -> Result<()> {
        if self.config.apply(options) {
            debug!("Connection settings changed, dropping shared driver");
            self.close().await?;
        }
        Ok(())
    }

    /// Close the shared driver, if one was created.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(driver) = std::mem::take(&mut self.driver).into_inner() {
            info!("Closing shared Neo4j driver");
            driver.close().await?;
        }
        Ok(())
    }

    /// Run one query or a batch in a fresh session.
    pub async fn execute(
        &self,
        batch: impl Into<Batch>,
        options: RunOptions,
    ) -> Result<Outcome<Response>> {
        let batch = batch.into();
        let result = self.execute_in_session(&batch, &options).await;
        if let Err(e) = &result {
            (self.notify_error)(e, Some(&batch));
        }
        result
    }

    async fn execute_in_session(
        &self,
        batch: &Batch,
        options: &RunOptions,
    ) -> Result<Outcome<Response>> {
        let (driver, per_call) = self.acquire_driver().await?;
        let result = async {
            let session = driver.session(self.config.database.as_deref()).await?;
            let result = run_batch(&session, batch, options, self.config.raw).await;
            close_session(&session).await;
            result
        }
        .await;
        release_driver(driver, per_call).await;
        result
    }

    /// Run `block` inside a write transaction.
    ///
    /// The transaction is committed when the block succeeds and is still open.
    /// On failure the error handler is notified with the last batch the block
    /// ran, the transaction is rolled back if still open, and the block's
    /// error is returned.
    pub async fn transaction<F, Fut, T>(&self, block: F) -> Result<T>
    where
        F: FnOnce(TxExecutor<ClientTransaction<C>>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_transaction(AccessMode::Write, block).await
    }

    pub async fn read_transaction<F, Fut, T>(&self, block: F) -> Result<T>
    where
        F: FnOnce(TxExecutor<ClientTransaction<C>>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_transaction(AccessMode::Read, block).await
    }

    pub async fn write_transaction<F, Fut, T>(&self, block: F) -> Result<T>
    where
        F: FnOnce(TxExecutor<ClientTransaction<C>>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_transaction(AccessMode::Write, block).await
    }

    /// Run a whole batch inside a single write transaction.
    pub async fn transaction_batch(
        &self,
        batch: impl Into<Batch>,
        options: RunOptions,
    ) -> Result<Outcome<Response>> {
        let batch = batch.into();
        self.transaction(move |tx| async move { tx.execute(batch, options).await })
            .await
    }

    async fn run_transaction<F, Fut, T>(&self, mode: AccessMode, block: F) -> Result<T>
    where
        F: FnOnce(TxExecutor<ClientTransaction<C>>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let (driver, per_call) = match self.acquire_driver().await {
            Ok(acquired) => acquired,
            Err(e) => {
                (self.notify_error)(&e, None);
                return Err(e);
            }
        };

        let result = async {
            let session = match driver.session(self.config.database.as_deref()).await {
                Ok(session) => session,
                Err(e) => {
                    (self.notify_error)(&e, None);
                    return Err(e);
                }
            };
            let result = self.run_in_transaction(&session, mode, block).await;
            close_session(&session).await;
            result
        }
        .await;

        release_driver(driver, per_call).await;
        result
    }

    async fn run_in_transaction<S, F, Fut, T>(
        &self,
        session: &S,
        mode: AccessMode,
        block: F,
    ) -> Result<T>
    where
        S: Session,
        F: FnOnce(TxExecutor<S::Transaction>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let txn = match session.begin_transaction(mode).await {
            Ok(txn) => Arc::new(txn),
            Err(e) => {
                (self.notify_error)(&e, None);
                return Err(e);
            }
        };
        let executor = TxExecutor::new(Arc::clone(&txn), self.config.raw);

        let outcome = match block(executor.clone()).await {
            Ok(value) if txn.is_open() => txn.commit().await.map(|_| value),
            other => other,
        };

        if let Err(e) = &outcome {
            (self.notify_error)(e, executor.last_batch().as_ref());
            if txn.is_open() {
                debug!("Rolling back transaction");
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("Failed to roll back transaction: {rollback_err}");
                }
            }
        }

        outcome
    }

    async fn acquire_driver(&self) -> Result<(Arc<C::Driver>, bool)> {
        if self.config.auto_close_driver {
            let driver = self.connector.connect(&self.config).await?;
            return Ok((Arc::new(driver), true));
        }

        let driver = self
            .driver
            .get_or_try_init(|| async {
                info!("Connecting shared Neo4j driver to {}", self.config.url);
                self.connector.connect(&self.config).await.map(Arc::new)
            })
            .await?;
        Ok((Arc::clone(driver), false))
    }
}

async fn close_session<S: Session>(session: &S) {
    if let Err(e) = session.close().await {
        warn!("Failed to close session: {e}");
    }
}

async fn release_driver<D: Driver>(driver: Arc<D>, per_call: bool) {
    if per_call {
        if let Err(e) = driver.close().await {
            warn!("Failed to close driver: {e}");
        }
    }
}
