//! dictql: SQL-style filtering and projection over key/value records.
//!
//! A query is parsed once into a [`RecordFilter`] and then applied to any
//! number of records:
//!
//! ```rust,ignore
//! use dictql::{into_record, RecordFilter};
//! use serde_json::json;
//!
//! let filter = RecordFilter::new("SELECT {name} FROM {sales_team} WHERE {sales} > 400")?;
//! let team = vec![
//!     into_record(json!({"name": "Bob", "sales": 400}))?,
//!     into_record(json!({"name": "Geoff", "sales": 500}))?,
//! ];
//! let top = filter.filter("sales_team", &team)?;
//! assert_eq!(top, vec![into_record(json!({"name": "Geoff"}))?]);
//! ```
//!
//! # Modules
//!
//! - [`query`]: lexer, parser, syntax tree and evaluation
//! - [`filter`]: compiled filters over collections
//! - [`config`]: evaluation policy
//! - [`otel`]: tracing spans and subscriber setup
//! - [`types`]: records and errors

pub mod config;
pub mod filter;
pub mod otel;
pub mod query;
pub mod types;

pub use config::{FilterConfig, MissingReferencePolicy};
pub use filter::{FilterIter, RecordFilter};
pub use query::{parse, ParsedQuery};
pub use types::{into_record, QueryError, Record, Result};
