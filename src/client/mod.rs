//! Execution Adapter
//!
//! Sends compiled Flux to a store through a pluggable executor and exposes
//! a conventional cursor over the returned rows.
//!
//! ## Architecture
//!
//! - **Executor**: trait with network and recording implementations
//! - **Cursor**: execute / fetchone / fetchmany / fetchall
//! - **Connection**: picks the executor once, hands out cursors
//!
//! ## Data Flow
//!
//! 1. `Connection::connect` resolves an executor from [`crate::config::ConnectionConfig`]
//! 2. `Cursor::execute` renders placeholders and sends the query
//! 3. Rows are buffered on the cursor until fetched

mod connection;
mod cursor;
mod executor;
mod http;

pub use connection::Connection;
pub use cursor::Cursor;
pub use executor::{ExecutionError, Executor, RecordingExecutor, Row};
pub use http::{parse_annotated_csv, NetworkConfig, NetworkExecutor};
