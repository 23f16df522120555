//! # fluxql
//!
//! Compiles relational-style query descriptions (filters, projection,
//! ordering, pagination) into Flux pipelines for a time-series store, and
//! runs them through a database-style cursor.
//!
//! ## Features
//!
//! - **Predicate compilation**: nested AND/OR trees become `filter()` stages
//! - **Time-range promotion**: bounds on `_time`/`time`/`timestamp` move into `range()`
//! - **Pagination**: slices become `limit(n:, offset:)`
//! - **Pluggable execution**: HTTP executor or an in-memory recording executor
//!
//! ## Modules
//!
//! - [`query`]: Descriptor types and the Flux compiler
//! - [`client`]: Executors, connections and cursors
//! - [`config`]: TOML/environment configuration
//! - [`logging`]: Tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust
//! use fluxql::client::{Connection, RecordingExecutor};
//! use fluxql::query::{compile, Query};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let query = Query::measurement("temperature")
//!         .bucket("example-bucket")
//!         .filter_lookup("time__gte", "2024-05-01T12:00:00Z")
//!         .filter_lookup("device", "sensor-1")
//!         .order_by("-time")
//!         .build();
//!
//!     let compiled = compile(&query)?;
//!
//!     let executor = Arc::new(RecordingExecutor::new());
//!     let connection = Connection::with_executor(executor.clone());
//!     let mut cursor = connection.cursor()?;
//!     let rows = cursor.execute(&compiled.flux, &[])?.fetchall();
//!
//!     assert!(rows.is_empty());
//!     assert_eq!(executor.last().as_deref(), Some(compiled.flux.as_str()));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod logging;
pub mod query;

// Re-export top-level types for convenience
pub use query::{
    compile, CompiledQuery, Connector, Lookup, OrderBy, Predicate, Query, QueryBuilder,
    QueryDescriptor, QueryError, QueryResult, Value,
};

pub use client::{
    Connection, Cursor, ExecutionError, Executor, NetworkConfig, NetworkExecutor,
    RecordingExecutor, Row,
};

pub use config::{Config, ConfigError, ConnectionConfig, ExecutorKind, LoggingConfig};
