//! Connections
//!
//! A connection owns the executor chosen from the connection parameters and
//! hands out cursors over it. The store has no transactions: commit and
//! rollback do nothing, while savepoints and explicit transaction blocks
//! fail.

use crate::client::cursor::Cursor;
use crate::client::executor::{Executor, RecordingExecutor, Row};
use crate::client::http::{NetworkConfig, NetworkExecutor};
use crate::config::{ConnectionConfig, ExecutorKind};
use crate::query::{compile, QueryDescriptor, QueryError, QueryResult};
use std::sync::Arc;

/// Connection to a Flux-speaking store
pub struct Connection {
    executor: Option<Arc<dyn Executor>>,
    bucket: Option<String>,
}

impl Connection {
    /// Resolve an executor from connection parameters.
    ///
    /// `auto` uses the network executor when a URL and token are set and
    /// falls back to recording otherwise.
    pub fn connect(config: &ConnectionConfig) -> QueryResult<Self> {
        let executor: Arc<dyn Executor> = match config.executor {
            ExecutorKind::Recording => Arc::new(RecordingExecutor::new()),
            ExecutorKind::Network => Arc::new(network_executor(config)?),
            ExecutorKind::Auto if config.has_credentials() => {
                Arc::new(network_executor(config)?)
            }
            ExecutorKind::Auto => {
                tracing::warn!("No store URL/token configured, recording queries only");
                Arc::new(RecordingExecutor::new())
            }
        };

        tracing::info!(
            executor = executor.name(),
            bucket = config.bucket.as_deref().unwrap_or("default"),
            "Connection opened"
        );

        Ok(Self {
            executor: Some(executor),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an existing executor
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor: Some(executor),
            bucket: None,
        }
    }

    /// Set the bucket applied to descriptors that name none
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Open a cursor
    pub fn cursor(&self) -> QueryResult<Cursor> {
        let executor = self.executor.as_ref().ok_or(QueryError::ConnectionClosed)?;
        Ok(Cursor::new(Arc::clone(executor)))
    }

    /// Compile a descriptor and run it, returning every row
    pub fn execute_descriptor(&self, query: &QueryDescriptor) -> QueryResult<Vec<Row>> {
        let compiled = match (&query.bucket, &self.bucket) {
            (None, Some(bucket)) => {
                let mut query = query.clone();
                query.bucket = Some(bucket.clone());
                compile(&query)?
            }
            _ => compile(query)?,
        };

        let mut cursor = self.cursor()?;
        let rows = cursor.execute(&compiled.flux, &compiled.params)?.fetchall();
        Ok(rows)
    }

    /// Release the executor; safe to call more than once
    pub fn close(&mut self) {
        if let Some(executor) = self.executor.take() {
            executor.close();
            tracing::debug!(executor = executor.name(), "Connection closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.executor.is_none()
    }

    /// Always true; failures surface when a query runs
    pub fn is_usable(&self) -> bool {
        true
    }

    /// No-op; writes are not transactional
    pub fn commit(&self) -> QueryResult<()> {
        Ok(())
    }

    /// No-op; there is nothing to roll back
    pub fn rollback(&self) -> QueryResult<()> {
        Ok(())
    }

    pub fn begin(&self) -> QueryResult<()> {
        Err(unsupported("transactions"))
    }

    pub fn savepoint(&self, _name: Option<&str>) -> QueryResult<String> {
        Err(unsupported("savepoints"))
    }

    pub fn savepoint_commit(&self, _name: &str) -> QueryResult<()> {
        Err(unsupported("savepoints"))
    }

    pub fn savepoint_rollback(&self, _name: &str) -> QueryResult<()> {
        Err(unsupported("savepoints"))
    }

    /// Schema changes; the store is schemaless
    pub fn schema_editor(&self) -> QueryResult<()> {
        Err(unsupported("schema mutation"))
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn unsupported(what: &str) -> QueryError {
    QueryError::UnsupportedOperation(format!("{} are not supported by the store", what))
}

fn network_executor(config: &ConnectionConfig) -> QueryResult<NetworkExecutor> {
    NetworkExecutor::new(network_config(config)?).map_err(QueryError::from)
}

fn network_config(config: &ConnectionConfig) -> QueryResult<NetworkConfig> {
    let (url, token) = match (&config.url, &config.token) {
        (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => (url, token),
        _ => {
            return Err(QueryError::Config(
                "network executor requires url and token".to_string(),
            ))
        }
    };

    Ok(NetworkConfig {
        url: url.clone(),
        token: token.clone(),
        org: config.org.clone(),
        request_timeout_ms: config.request_timeout_secs.saturating_mul(1000),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    fn recording_config() -> ConnectionConfig {
        ConnectionConfig {
            executor: ExecutorKind::Recording,
            bucket: Some("example-bucket".to_string()),
            ..ConnectionConfig::default()
        }
    }

    #[test]
    fn test_cursor_records_compiled_flux() {
        let executor = Arc::new(RecordingExecutor::new());
        let connection = Connection::with_executor(executor.clone()).bucket("example-bucket");

        let query = Query::measurement("temperature")
            .filter_lookup("device", "sensor-99")
            .bucket("example-bucket")
            .build();
        let flux = compile(&query).unwrap().flux;

        {
            let mut cursor = connection.cursor().unwrap();
            cursor.execute(&flux, &[]).unwrap();
            assert_eq!(cursor.last_query(), Some(flux.as_str()));
        }

        assert_eq!(executor.history().last(), Some(&flux));
    }

    #[test]
    fn test_execute_descriptor_applies_connection_bucket() {
        let executor = Arc::new(RecordingExecutor::new());
        let connection = Connection::with_executor(executor.clone()).bucket("example-bucket");

        let rows = connection
            .execute_descriptor(&Query::measurement("temperature").build())
            .unwrap();

        assert!(rows.is_empty());
        let sent = executor.last().unwrap();
        assert!(sent.starts_with(r#"from(bucket: "example-bucket")"#));
    }

    #[test]
    fn test_compile_error_never_reaches_executor() {
        let executor = Arc::new(RecordingExecutor::new());
        let connection = Connection::with_executor(executor.clone());

        let query = Query::measurement("m").filter_lookup("device__in", "a").build();
        let err = connection.execute_descriptor(&query).unwrap_err();

        assert!(matches!(err, QueryError::UnsupportedLookup(_)));
        assert!(executor.is_empty());
    }

    #[test]
    fn test_connect_recording() {
        let connection = Connection::connect(&recording_config()).unwrap();
        assert!(connection.is_usable());
        assert!(connection.cursor().is_ok());
    }

    #[test]
    fn test_connect_auto_without_credentials_records() {
        let config = ConnectionConfig::default();
        assert_eq!(config.executor, ExecutorKind::Auto);

        let connection = Connection::connect(&config).unwrap();
        let mut cursor = connection.cursor().unwrap();
        assert!(cursor.execute("q", &[]).unwrap().fetchall().is_empty());
    }

    #[test]
    fn test_connect_network_requires_credentials() {
        let config = ConnectionConfig {
            executor: ExecutorKind::Network,
            url: Some("http://localhost:8086".to_string()),
            ..ConnectionConfig::default()
        };
        let err = Connection::connect(&config).err().unwrap();
        assert!(matches!(err, QueryError::Config(_)));
    }

    #[test]
    fn test_network_config_timeout_saturates() {
        let mut config = ConnectionConfig {
            executor: ExecutorKind::Network,
            url: Some("http://localhost:8086".to_string()),
            token: Some("secret".to_string()),
            org: Some("acme".to_string()),
            ..ConnectionConfig::default()
        };

        let network = network_config(&config).unwrap();
        assert_eq!(network.request_timeout_ms, 30_000);
        assert_eq!(network.org.as_deref(), Some("acme"));

        config.request_timeout_secs = u64::MAX;
        let network = network_config(&config).unwrap();
        assert_eq!(network.request_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_dropped_cursor_leaves_executor_serving() {
        let executor = Arc::new(RecordingExecutor::new());
        let connection = Connection::with_executor(executor.clone());

        let mut kept = connection.cursor().unwrap();
        {
            let mut dropped = connection.cursor().unwrap();
            dropped.execute("first", &[]).unwrap();
        }
        kept.execute("second", &[]).unwrap();
        connection.cursor().unwrap().execute("third", &[]).unwrap();

        assert_eq!(executor.history(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut connection = Connection::connect(&recording_config()).unwrap();
        connection.close();
        connection.close();

        assert!(connection.is_closed());
        assert!(matches!(
            connection.cursor().err(),
            Some(QueryError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_transaction_surface() {
        let connection = Connection::connect(&recording_config()).unwrap();

        assert!(connection.commit().is_ok());
        assert!(connection.rollback().is_ok());
        assert!(matches!(
            connection.begin(),
            Err(QueryError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            connection.savepoint(None),
            Err(QueryError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            connection.savepoint_commit("s1"),
            Err(QueryError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            connection.savepoint_rollback("s1"),
            Err(QueryError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            connection.schema_editor(),
            Err(QueryError::UnsupportedOperation(_))
        ));
    }
}
