//! Neo4j/Bolt value conversions for the neo4j-helper client.
//!
//! This crate turns host values into Bolt parameters and Bolt records back
//! into plain host maps. It performs no I/O.
//!
//! # Modules
//!
//! - [`forward`] - host `Value` → Bolt parameters and Cypher literals
//! - [`reverse`] - Bolt records → flattened host maps
//! - [`temporal`] - Bolt temporal values as chrono types
//! - [`date`] - lenient date parsing into temporal values
//! - [`moment`] - the `Moment` date wrapper
//! - [`text`] - small string helpers for user input
//! - [`error`] - Error types for conversion failures
//!
//! # Key Design Principles
//!
//! 1. **New structures out** - normalizing and parsing never modify their input
//! 2. **No silent fallbacks** - decoding failures are explicit errors; only
//!    date *parsing* of loose input fails soft to `None`
//! 3. **Timezone-aware** - zoned conversions accept IANA timezone names
//!
//! # Example
//!
//! ```ignore
//! use neo4j_types::{normalize_params, parse_response, Map, ParseOptions, Record, Value};
//!
//! let mut params = Map::new();
//! params.insert("age".to_string(), Value::Integer(30));
//! let bolt_params = normalize_params(&params)?;
//!
//! let record = Record::new().with("p.name", neo4rs::BoltType::from("Ana"));
//! let rows = parse_response(&[record], &ParseOptions::default())?;
//! assert_eq!(rows[0]["name"], Value::from("Ana"));
//! ```

pub mod date;
pub mod error;
pub mod forward;
pub mod moment;
pub mod reverse;
pub mod temporal;
pub mod text;
pub mod value;

pub use date::{parse_date, parse_date_cypher, DateInput, DateParts, DEFAULT_INPUT_FORMAT};
pub use error::{Neo4jTypesError, Result};
pub use forward::{
    cypher_literal, cypher_map_literal, cypher_replace_params, normalize_params, normalize_value,
};
pub use moment::Moment;
pub use reverse::{convert_bolt_to_value, field_name, parse_response, DateType, ParseOptions, Record};
pub use temporal::{is_temporal, is_wire_integer, Temporal, TemporalKind};
pub use text::{clear_string_for_regex, to_float_or_null, to_int_or_null};
pub use value::{Map, Value};
