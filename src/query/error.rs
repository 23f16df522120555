//! Query error types
//!
//! Defines all error conditions that can occur while compiling a query or
//! running it through an executor.

use crate::client::ExecutionError;
use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Lookup operator without a Flux equivalent
    #[error("Lookup '{0}' is not supported for Flux translation")]
    UnsupportedLookup(String),

    /// Feature the pipeline language or the store cannot express
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    /// The executor failed to run the query
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Connection was closed before use
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Connection parameters are unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
