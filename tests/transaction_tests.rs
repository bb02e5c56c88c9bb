//! Transaction scoping against the in-memory driver.

use neo4j_helper::testing::{Event, MemoryConnector};
use neo4j_helper::{
    chain, AccessMode, Batch, ClientConfig, Neo4jHelper, Neo4jHelperError, Outcome, QuerySpec,
    RunOptions, Value,
};
use std::sync::{Arc, Mutex};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("neo4j_helper=debug")
        .try_init()
        .ok(); // Ignore if already initialized
}

fn client(connector: MemoryConnector) -> Neo4jHelper<MemoryConnector> {
    Neo4jHelper::with_connector(connector, ClientConfig::new("bolt://memory:7687"))
}

#[tokio::test]
async fn test_successful_block_commits() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector);

    let name = client
        .transaction(|tx| async move {
            tx.execute("CREATE (:Person {name: 'Ana'})", RunOptions::default())
                .await?;
            let outcome = tx
                .execute(
                    QuerySpec::new("RETURN $name AS name").param("name", "Ana"),
                    RunOptions::default(),
                )
                .await?;
            Ok::<_, Neo4jHelperError>(chain::first_field(&outcome, "name").cloned())
        })
        .await
        .unwrap();

    assert_eq!(name, Some(Value::from("Ana")));
    assert_eq!(state.count(&Event::Begin(AccessMode::Write)), 1);
    assert_eq!(state.count(&Event::Commit), 1);
    assert_eq!(state.count(&Event::Rollback), 0);
    assert_eq!(state.committed().len(), 2);
    assert_eq!(state.count(&Event::SessionClose), 1);
}

#[tokio::test]
async fn test_failing_block_rolls_back() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let notified: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let notified_in_handler = Arc::clone(&notified);
    let client = client(connector).with_error_handler(move |_, batch| {
        notified_in_handler
            .lock()
            .unwrap()
            .push(batch.and_then(Batch::last).map(|q| q.cypher.clone()));
    });

    let result: neo4j_helper::Result<()> = client
        .transaction(|tx| async move {
            tx.execute("CREATE (:Person {name: 'Ana'})", RunOptions::default())
                .await?;
            Err(Neo4jHelperError::query("validation failed"))
        })
        .await;

    match result {
        Err(Neo4jHelperError::Query(message)) => assert_eq!(message, "validation failed"),
        other => panic!("Expected the block's error, got {other:?}"),
    }
    assert_eq!(state.count(&Event::Commit), 0);
    assert_eq!(state.count(&Event::Rollback), 1);
    assert!(state.committed().is_empty());
    assert_eq!(state.count(&Event::SessionClose), 1);

    // Notified with the last query the block ran
    assert_eq!(
        *notified.lock().unwrap(),
        vec![Some("CREATE (:Person {name: 'Ana'})".to_string())]
    );
}

#[tokio::test]
async fn test_failing_query_rolls_back() {
    init_tracing();
    let connector = MemoryConnector::failing_on("BROKEN");
    let state = connector.state();
    let client = client(connector);

    let result = client
        .transaction(|tx| async move {
            tx.execute("CREATE (:A)", RunOptions::default()).await?;
            tx.execute("BROKEN", RunOptions::default()).await?;
            tx.execute("CREATE (:B)", RunOptions::default()).await
        })
        .await;

    assert!(result.is_err());
    assert_eq!(state.ran(), vec!["CREATE (:A)".to_string(), "BROKEN".to_string()]);
    assert_eq!(state.count(&Event::Rollback), 1);
    assert_eq!(state.count(&Event::Commit), 0);
    assert!(state.committed().is_empty());
}

#[tokio::test]
async fn test_transaction_open_during_block() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector);

    let result = client
        .transaction(|tx| async move {
            tx.execute("CREATE (:A)", RunOptions::default()).await?;
            assert!(tx.is_open());
            Ok::<_, Neo4jHelperError>(())
        })
        .await;
    assert!(result.is_ok());
    assert_eq!(state.count(&Event::Commit), 1);
}

#[tokio::test]
async fn test_block_success_on_closed_transaction_skips_commit() {
    init_tracing();
    let connector = MemoryConnector::new().closing_on("TERMINATE");
    let state = connector.state();
    let notified = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&notified);
    let client = client(connector).with_error_handler(move |_, _| *counter.lock().unwrap() += 1);

    let still_open = client
        .transaction(|tx| async move {
            tx.execute("CREATE (:A)", RunOptions::default()).await?;
            tx.execute("CALL db.terminate() // TERMINATE", RunOptions::default())
                .await?;
            Ok::<_, Neo4jHelperError>(tx.is_open())
        })
        .await
        .unwrap();

    assert!(!still_open);
    assert_eq!(state.count(&Event::Commit), 0);
    assert_eq!(state.count(&Event::Rollback), 0);
    assert!(state.committed().is_empty());
    assert_eq!(*notified.lock().unwrap(), 0);
    assert_eq!(state.count(&Event::SessionClose), 1);
}

#[tokio::test]
async fn test_read_transaction_mode() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector);

    client
        .read_transaction(|tx| async move {
            tx.execute("MATCH (n) RETURN n", RunOptions::default()).await?;
            Ok::<_, Neo4jHelperError>(())
        })
        .await
        .unwrap();
    client
        .write_transaction(|tx| async move {
            tx.execute("CREATE (:A)", RunOptions::default()).await?;
            Ok::<_, Neo4jHelperError>(())
        })
        .await
        .unwrap();

    assert_eq!(
        state
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Begin(_)))
            .collect::<Vec<_>>(),
        vec![Event::Begin(AccessMode::Read), Event::Begin(AccessMode::Write)]
    );
}

#[tokio::test]
async fn test_transaction_batch() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector);

    let outcome = client
        .transaction_batch(
            vec![
                QuerySpec::new("RETURN $a AS a").param("a", 1),
                QuerySpec::new("RETURN $b AS b").param("b", 2),
            ],
            RunOptions::default(),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Many(ref r) if r.len() == 2));
    assert!(state
        .events()
        .iter()
        .all(|e| !matches!(e, Event::Run { in_transaction: false, .. })));
    assert_eq!(state.count(&Event::Commit), 1);
    assert_eq!(state.committed().len(), 2);
}

#[tokio::test]
async fn test_transaction_releases_per_call_driver() {
    init_tracing();
    let connector = MemoryConnector::failing_on("BROKEN");
    let state = connector.state();
    let mut config = ClientConfig::new("bolt://memory:7687");
    config.auto_close_driver = true;
    let client = Neo4jHelper::with_connector(connector, config);

    let result = client.transaction_batch("BROKEN", RunOptions::default()).await;

    assert!(result.is_err());
    assert_eq!(state.count(&Event::Connect), 1);
    assert_eq!(state.count(&Event::DriverClose), 1);
    assert_eq!(state.count(&Event::SessionClose), 1);
}
