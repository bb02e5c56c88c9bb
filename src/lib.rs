//! neo4j-helper Library
//!
//! A convenience layer over Neo4j for running Cypher from Rust.
//!
//! # Features
//!
//! - Parameter normalization: host values become Bolt wire values, integers
//!   are sent as wire integers and dates as temporal values
//! - Batches: several queries issued concurrently, results in input order
//! - Transactions: scoped blocks that commit on success and roll back on error
//! - Record parsing: records flattened into plain maps, with nodes and
//!   relationships replaced by their properties
//! - Lifecycle: sessions and per-call drivers are always released
//!
//! # Usage
//!
//! ```ignore
//! use neo4j_helper::{chain, ClientConfig, Neo4jHelper, QuerySpec, RunOptions};
//!
//! let client = Neo4jHelper::new(ClientConfig::new("bolt://localhost:7687"));
//! let outcome = client
//!     .execute(
//!         QuerySpec::new("MATCH (p:Person {name: $name}) RETURN p.name, p.age").param("name", "Ana"),
//!         RunOptions::default(),
//!     )
//!     .await?;
//! let age = chain::first_field(&outcome, "age");
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! neo4j-helper run "MATCH (n) RETURN count(n) AS total" --url bolt://localhost:7687
//! ```

use clap::Parser;

pub mod chain;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod neo4j;
pub mod query;
pub mod result;
pub mod testing;
pub mod transaction;

pub use client::{ClientTransaction, ErrorHandler, Neo4jHelper};
pub use config::{ClientConfig, ClientOptions, DriverConfig};
pub use driver::AccessMode;
pub use error::{Neo4jHelperError, Result};
pub use query::{Batch, QuerySpec, Statement};
pub use result::{Outcome, QueryResult, RawResponse, Response, ReturnType, RunOptions};
pub use transaction::TxExecutor;

// Conversion crate, re-exported for callers building parameters
pub use neo4j_types as types;
pub use neo4j_types::{DateType, Map, ParseOptions, Temporal, TemporalKind, Value};

/// Connection settings accepted on the command line.
#[derive(Parser, Clone, Debug, Default)]
pub struct ConnectionOpts {
    /// Neo4j Bolt URL
    #[arg(long, env = "NEO4J_URL")]
    pub url: Option<String>,

    /// Neo4j username
    #[arg(long, env = "NEO4J_USERNAME")]
    pub username: Option<String>,

    /// Neo4j password
    #[arg(long, env = "NEO4J_PASSWORD")]
    pub password: Option<String>,

    /// Neo4j database (server default when unset)
    #[arg(long, env = "NEO4J_DATABASE")]
    pub database: Option<String>,

    /// Open a fresh driver for the run and close it afterwards
    #[arg(long)]
    pub auto_close_driver: bool,
}

// CLI type → client option conversions
impl From<&ConnectionOpts> for ClientOptions {
    fn from(opts: &ConnectionOpts) -> Self {
        Self {
            url: opts.url.clone(),
            username: opts.username.clone(),
            password: opts.password.clone(),
            database: opts.database.clone(),
            auto_close_driver: opts.auto_close_driver.then_some(true),
            ..Default::default()
        }
    }
}
