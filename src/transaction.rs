//! Handle given to transaction blocks.

use crate::client::run_batch;
use crate::driver::Transaction;
use crate::error::Result;
use crate::query::Batch;
use crate::result::{Outcome, Response, RunOptions};
use std::sync::{Arc, Mutex, PoisonError};

/// Runs queries inside an open transaction.
///
/// Cheap to clone; every clone drives the same transaction. Commit and
/// rollback are left to the client.
pub struct TxExecutor<T: Transaction> {
    txn: Arc<T>,
    force_raw: bool,
    last_batch: Arc<Mutex<Option<Batch>>>,
}

impl<T: Transaction> Clone for TxExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            txn: Arc::clone(&self.txn),
            force_raw: self.force_raw,
            last_batch: Arc::clone(&self.last_batch),
        }
    }
}

impl<T: Transaction> TxExecutor<T> {
    pub(crate) fn new(txn: Arc<T>, force_raw: bool) -> Self {
        Self {
            txn,
            force_raw,
            last_batch: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a batch inside the transaction.
    pub async fn execute(
        &self,
        batch: impl Into<Batch>,
        options: RunOptions,
    ) -> Result<Outcome<Response>> {
        let batch = batch.into();
        *self
            .last_batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(batch.clone());
        run_batch(self.txn.as_ref(), &batch, &options, self.force_raw).await
    }

    pub fn is_open(&self) -> bool {
        self.txn.is_open()
    }

    /// The most recent batch passed to [`TxExecutor::execute`].
    pub fn last_batch(&self) -> Option<Batch> {
        self.last_batch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::driver::{AccessMode, Connector, Driver, Session};
    use crate::testing::MemoryConnector;
    use crate::Neo4jHelperError;

    async fn open_executor() -> TxExecutor<crate::testing::MemoryTransaction> {
        let connector = MemoryConnector::new();
        let driver = connector.connect(&ClientConfig::default()).await.unwrap();
        let session = driver.session(None).await.unwrap();
        let txn = session.begin_transaction(AccessMode::Write).await.unwrap();
        TxExecutor::new(Arc::new(txn), false)
    }

    #[test]
    fn test_last_batch_follows_clones() {
        tokio_test::block_on(async {
            let executor = open_executor().await;
            assert!(executor.last_batch().is_none());

            executor.execute("RETURN 1", RunOptions::default()).await.unwrap();
            executor
                .clone()
                .execute("RETURN 2", RunOptions::default())
                .await
                .unwrap();

            let last = executor.last_batch().unwrap();
            assert_eq!(last.last().unwrap().cypher, "RETURN 2");
        });
    }

    #[test]
    fn test_execute_after_commit_fails() {
        tokio_test::block_on(async {
            let executor = open_executor().await;
            executor.txn.commit().await.unwrap();
            assert!(!executor.is_open());

            let result = executor.execute("RETURN 1", RunOptions::default()).await;
            assert!(matches!(result, Err(Neo4jHelperError::TransactionClosed)));
        });
    }
}
