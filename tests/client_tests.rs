//! Client behaviour against the in-memory driver: batch shapes, sessions,
//! driver lifecycle and error notification.

use neo4j_helper::testing::{Event, MemoryConnector};
use neo4j_helper::{
    chain, Batch, ClientConfig, ClientOptions, Neo4jHelper, Neo4jHelperError, Outcome, QuerySpec,
    Response, ReturnType, RunOptions, Value,
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
async fn test_empty_batch_is_empty() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector);

    let outcome = client.execute(Batch::new(), RunOptions::default()).await.unwrap();

    assert_eq!(outcome, Outcome::Empty);
    assert!(state.ran().is_empty());
    assert_eq!(state.count(&Event::SessionClose), 1);
}

#[tokio::test]
async fn test_single_query_is_single() {
    init_tracing();
    let client = client(MemoryConnector::new());

    let outcome = client
        .execute(
            QuerySpec::new("RETURN $name AS name, $age AS age")
                .param("name", "Ana")
                .param("age", 30),
            RunOptions::default(),
        )
        .await
        .unwrap();

    match &outcome {
        Outcome::Single(Response::Parsed(rows)) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["name"], Value::from("Ana"));
            assert_eq!(rows[0]["age"], Value::Integer(30));
        }
        other => panic!("Expected a single parsed response, got {other:?}"),
    }
    assert_eq!(chain::first_field(&outcome, "age"), Some(&Value::Integer(30)));
}

#[tokio::test]
async fn test_many_queries_keep_input_order() {
    init_tracing();
    let client = client(MemoryConnector::new());

    let batch: Batch = (0..5)
        .map(|i| QuerySpec::new("RETURN $i AS i").param("i", i))
        .collect();
    let outcome = client.execute(batch, RunOptions::default()).await.unwrap();

    let responses = match outcome {
        Outcome::Many(responses) => responses,
        other => panic!("Expected many responses, got {other:?}"),
    };
    assert_eq!(responses.len(), 5);
    for (i, response) in responses.iter().enumerate() {
        let rows = response.rows().unwrap();
        assert_eq!(rows[0]["i"], Value::Integer(i as i64));
    }
}

#[tokio::test]
async fn test_qualified_fields_are_flattened() {
    init_tracing();
    let connector = MemoryConnector::new().with_handler(|_| {
        Ok(neo4j_helper::RawResponse::new(vec![
            neo4j_helper::types::Record::new()
                .with("p.name", neo4rs::BoltType::String(neo4rs::BoltString::new("Ana")))
                .with("p.age", neo4rs::BoltType::Integer(neo4rs::BoltInteger::new(30))),
        ]))
    });
    let client = client(connector);

    let outcome = client
        .execute("MATCH (p:Person) RETURN p.name, p.age", RunOptions::default())
        .await
        .unwrap();

    let row = chain::first(&outcome).unwrap();
    assert_eq!(row.len(), 2);
    assert_eq!(row["name"], Value::from("Ana"));
    assert_eq!(row["age"], Value::Integer(30));
}

#[tokio::test]
async fn test_raw_flag_forces_raw_responses() {
    init_tracing();
    let mut config = ClientConfig::new("bolt://memory:7687");
    config.raw = true;
    let client = Neo4jHelper::with_connector(MemoryConnector::new(), config);

    let options = RunOptions::default().with_return_type(ReturnType::Parser);
    let outcome = client
        .execute(QuerySpec::new("RETURN $x AS x").param("x", 1), options)
        .await
        .unwrap();

    match outcome {
        Outcome::Single(Response::Raw(raw)) => assert_eq!(raw.keys, vec!["x".to_string()]),
        other => panic!("Expected a raw response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_shared_driver_is_reused() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let mut client = client(connector);

    client.execute("RETURN 1", RunOptions::default()).await.unwrap();
    client.execute("RETURN 2", RunOptions::default()).await.unwrap();

    assert_eq!(state.count(&Event::Connect), 1);
    assert_eq!(state.count(&Event::SessionOpen), 2);
    assert_eq!(state.count(&Event::SessionClose), 2);
    assert_eq!(state.count(&Event::DriverClose), 0);

    client.close().await.unwrap();
    assert_eq!(state.count(&Event::DriverClose), 1);
}

#[tokio::test]
async fn test_auto_close_driver_per_call() {
    init_tracing();
    let connector = MemoryConnector::failing_on("FAIL");
    let state = connector.state();
    let mut config = ClientConfig::new("bolt://memory:7687");
    config.auto_close_driver = true;
    let client = Neo4jHelper::with_connector(connector, config);

    client.execute("RETURN 1", RunOptions::default()).await.unwrap();
    assert!(client.execute("FAIL", RunOptions::default()).await.is_err());

    // Released on the error path too
    assert_eq!(state.count(&Event::Connect), 2);
    assert_eq!(state.count(&Event::DriverClose), 2);
    assert_eq!(state.count(&Event::SessionClose), 2);
}

#[tokio::test]
async fn test_error_is_notified_and_returned() {
    init_tracing();
    let seen: Arc<Mutex<Vec<(String, Option<usize>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_handler = Arc::clone(&seen);
    let client = client(MemoryConnector::failing_on("BROKEN")).with_error_handler(
        move |e, batch| {
            seen_in_handler
                .lock()
                .unwrap()
                .push((e.to_string(), batch.map(Batch::len)));
        },
    );

    let result = client
        .execute(vec!["RETURN 1", "BROKEN QUERY"], RunOptions::default())
        .await;

    assert!(matches!(result, Err(Neo4jHelperError::Query(_))));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].0.contains("BROKEN QUERY"));
    assert_eq!(seen[0].1, Some(2));
}

#[tokio::test]
async fn test_normalization_error_is_notified() {
    init_tracing();
    let notified = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&notified);
    let connector = MemoryConnector::new();
    let state = connector.state();
    let client = client(connector).with_error_handler(move |_, _| *counter.lock().unwrap() += 1);

    let result = client
        .execute(
            QuerySpec::new("RETURN $x").param("x", f64::INFINITY),
            RunOptions::default(),
        )
        .await;

    assert!(matches!(result, Err(Neo4jHelperError::Conversion(_))));
    assert_eq!(*notified.lock().unwrap(), 1);
    assert!(state.ran().is_empty());
}

#[tokio::test]
async fn test_update_options_reconnects() {
    init_tracing();
    let connector = MemoryConnector::new();
    let state = connector.state();
    let mut client = client(connector);

    client.execute("RETURN 1", RunOptions::default()).await.unwrap();
    client
        .update_options(ClientOptions {
            url: Some("bolt://other:7687".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    client.execute("RETURN 2", RunOptions::default()).await.unwrap();

    assert_eq!(client.config().url, "bolt://other:7687");
    assert_eq!(state.count(&Event::Connect), 2);
    assert_eq!(state.count(&Event::DriverClose), 1);
}

#[tokio::test]
async fn test_caller_params_untouched() {
    init_tracing();
    let client = client(MemoryConnector::new());
    let spec = QuerySpec::new("RETURN $n AS n, $list AS list")
        .param("n", 7)
        .param("list", vec![Value::Integer(1), Value::Float(f64::NAN)]);
    let before = spec.clone();

    let outcome = client.execute(spec.clone(), RunOptions::default()).await.unwrap();

    // PartialEq on NaN: compare the parts that are comparable
    assert_eq!(spec.cypher, before.cypher);
    assert_eq!(spec.params["n"], Value::Integer(7));
    assert!(matches!(
        spec.params["list"].as_list().unwrap()[1],
        Value::Float(f) if f.is_nan()
    ));
    let row = chain::first(&outcome).unwrap();
    assert_eq!(
        row["list"],
        Value::List(vec![Value::Integer(1), Value::Null])
    );
}
