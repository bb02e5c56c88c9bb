//! Command-line interface for neo4j-helper
//!
//! # Usage Examples
//!
//! ## Running queries
//! ```bash
//! # Single query, parsed rows printed as JSON
//! neo4j-helper run "MATCH (p:Person) RETURN p.name, p.age" \
//!   --url bolt://localhost:7687 --username neo4j --password secret
//!
//! # Parameters are KEY=JSON; plain text is taken as a string
//! neo4j-helper run "MATCH (p:Person {name: \$name}) RETURN p" --param name=Ana
//!
//! # Several queries in one transaction, dates as epoch milliseconds
//! neo4j-helper run "CREATE (:Tag {name: 'a'})" "CREATE (:Tag {name: 'b'})" \
//!   --transaction --date-type timestamp
//!
//! # Connection settings from a TOML file
//! neo4j-helper run "RETURN 1 AS one" --config neo4j-helper.toml
//! ```
//!
//! ## Dates
//! ```bash
//! # Render user input as a Cypher temporal constructor
//! neo4j-helper date 15/06/2024 --kind date
//! neo4j-helper date "2024-06-15 10:30" --format "YYYY-MM-DD HH:mm"
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use neo4j_helper::types::{parse_date_cypher, DateType, Map, TemporalKind, Value};
use neo4j_helper::{
    Batch, ClientConfig, ClientOptions, ConnectionOpts, Neo4jHelper, QuerySpec, ReturnType,
    RunOptions,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "neo4j-helper")]
#[command(about = "Run Cypher against Neo4j and print the results as JSON")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more Cypher queries as a batch
    Run {
        /// Cypher queries; all of them are sent together
        #[arg(required = true)]
        cypher: Vec<String>,

        /// Query parameter as KEY=JSON, passed to every query (repeatable)
        #[arg(long = "param", value_name = "KEY=JSON")]
        params: Vec<String>,

        /// Run the whole batch in a single transaction
        #[arg(long)]
        transaction: bool,

        /// Result shape
        #[arg(long, value_enum, default_value = "parser")]
        return_type: ReturnType,

        /// Date representation in parsed rows (moment, native, timestamp, raw)
        #[arg(long, default_value = "moment")]
        date_type: DateType,

        /// IANA timezone for date conversion (e.g. "America/Sao_Paulo")
        #[arg(long)]
        timezone: Option<String>,

        /// Log every statement with its parameters substituted
        #[arg(long)]
        debug: bool,

        /// Always print raw responses
        #[arg(long)]
        raw: bool,

        /// TOML configuration file
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Connection options
        #[command(flatten)]
        connection: ConnectionOpts,
    },

    /// Parse a date and print it as a Cypher temporal literal
    Date {
        /// Date text, or epoch milliseconds
        input: String,

        /// Temporal kind (date, date_time, local_date_time, time, local_time)
        #[arg(long, default_value = "local_date_time")]
        kind: TemporalKind,

        /// Input format with moment-style tokens (default: DD/MM/YYYY)
        #[arg(long)]
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            cypher,
            params,
            transaction,
            return_type,
            date_type,
            timezone,
            debug,
            raw,
            config,
            connection,
        } => {
            let mut client_config = match &config {
                Some(path) => ClientConfig::from_file(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?,
                None => ClientConfig::default(),
            };
            client_config.apply(ClientOptions::from(&connection));
            if raw {
                client_config.raw = true;
            }

            let params = parse_params(&params)?;
            let batch: Batch = cypher
                .into_iter()
                .map(|c| QuerySpec::with_params(c, params.clone()))
                .collect();

            let mut options = RunOptions::default()
                .with_return_type(return_type)
                .with_date_type(date_type);
            options.parse.timezone = timezone;
            options.debug = debug;

            run_queries(client_config, batch, options, transaction).await
        }
        Commands::Date {
            input,
            kind,
            format,
        } => {
            let value = match input.trim().parse::<i64>() {
                Ok(millis) if format.is_none() => Value::Integer(millis),
                _ => Value::String(input.clone()),
            };
            let date_input = neo4j_helper::types::DateInput::from_value(&value)
                .with_context(|| format!("Unsupported date input: {input}"))?;
            let literal = parse_date_cypher(date_input, kind, format.as_deref())
                .with_context(|| format!("Could not parse date: {input}"))?;
            println!("{literal}");
            Ok(())
        }
    }
}

async fn run_queries(
    config: ClientConfig,
    batch: Batch,
    options: RunOptions,
    transaction: bool,
) -> anyhow::Result<()> {
    tracing::info!("Running {} queries against {}", batch.len(), config.url);

    let mut client = Neo4jHelper::new(config).with_error_handler(|e, batch| {
        let last = batch.and_then(|b| b.last()).map(|q| q.cypher.as_str());
        tracing::error!("Query failed: {e} (last query: {last:?})");
    });

    let outcome = if transaction {
        client.transaction_batch(batch, options).await
    } else {
        client.execute(batch, options).await
    };
    client.close().await.context("Failed to close Neo4j driver")?;

    let outcome = outcome.context("Query execution failed")?;
    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);
    Ok(())
}

/// Parse `KEY=JSON` pairs. Values that are not valid JSON are taken as strings.
fn parse_params(pairs: &[String]) -> anyhow::Result<Map> {
    let mut params = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Invalid parameter '{pair}', expected KEY=JSON"))?;
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        params.insert(key.trim().to_string(), value);
    }
    Ok(params)
}
