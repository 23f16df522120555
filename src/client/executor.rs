//! Query executors
//!
//! An [`Executor`] sends Flux text to a store and hands back rows. The
//! [`RecordingExecutor`] keeps every query it is given and returns nothing,
//! which is what tests and unconfigured environments run against.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// One result row, column name → value as returned by the store
pub type Row = BTreeMap<String, String>;

/// Something that can run a Flux query
pub trait Executor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run a query and return its rows
    fn query(&self, flux: &str) -> Result<Vec<Row>, ExecutionError>;

    /// Release any handle held by the executor.
    ///
    /// Every cursor of a connection shares one executor and calls this when
    /// it closes or drops, so implementations must tolerate repeated calls
    /// and keep serving the connection's remaining cursors.
    fn close(&self) {}
}

/// Executor that records queries instead of running them
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    history: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query executed so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// The most recent query
    pub fn last(&self) -> Option<String> {
        self.lock().last().cloned()
    }

    /// Number of recorded queries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Each push is a single operation, so a poisoned history is still whole
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Executor for RecordingExecutor {
    fn name(&self) -> &str {
        "recording"
    }

    fn query(&self, flux: &str) -> Result<Vec<Row>, ExecutionError> {
        self.lock().push(flux.to_string());
        Ok(Vec::new())
    }
}

/// Errors surfaced by an executor
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Store unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<csv::Error> for ExecutionError {
    fn from(err: csv::Error) -> Self {
        ExecutionError::Decode(err.to_string())
    }
}
