//! InfluxDB 2.x HTTP executor
//!
//! Posts Flux text to `/api/v2/query` and decodes the annotated CSV
//! response into rows. Failures are returned as-is; there is no retry.

use crate::client::executor::{ExecutionError, Executor, Row};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

/// Settings for the network executor
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Base URL of the store (e.g., "http://localhost:8086")
    pub url: String,
    /// API token
    pub token: String,
    /// Organization name; omitted from the request when empty
    pub org: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl NetworkConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            org: None,
            request_timeout_ms: 30_000,
        }
    }

    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }
}

/// Executor backed by the store's HTTP query API
pub struct NetworkExecutor {
    client: Client,
    config: NetworkConfig,
}

impl NetworkExecutor {
    /// Create a new executor with the given configuration
    pub fn new(config: NetworkConfig) -> Result<Self, ExecutionError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Full query endpoint including the organization parameter
    pub fn endpoint(&self) -> String {
        let base = self.config.url.trim_end_matches('/');
        match self.config.org.as_deref().filter(|o| !o.is_empty()) {
            Some(org) => format!("{}/api/v2/query?org={}", base, urlencoding::encode(org)),
            None => format!("{}/api/v2/query", base),
        }
    }
}

impl Executor for NetworkExecutor {
    fn name(&self) -> &str {
        "network"
    }

    fn query(&self, flux: &str) -> Result<Vec<Row>, ExecutionError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(CONTENT_TYPE, "application/vnd.flux")
            .header(ACCEPT, "application/csv")
            .body(flux.to_string())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExecutionError::Timeout
                } else if e.is_connect() {
                    ExecutionError::Unavailable
                } else {
                    ExecutionError::Request(e)
                }
            })?;

        let status = response.status();
        let text = response.text()?;

        if status.is_success() {
            let rows = parse_annotated_csv(&text)?;
            tracing::debug!("query returned {} rows", rows.len());
            Ok(rows)
        } else {
            Err(ExecutionError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Pull `message` out of a JSON error body, else return the body as-is
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Decode a Flux CSV response.
///
/// Each table carries its own header row (`,result,table,...`); the
/// unnamed leading column and `#` annotation lines are dropped.
pub fn parse_annotated_csv(text: &str) -> Result<Vec<Row>, ExecutionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let is_header = record.get(1) == Some("result") && record.get(2) == Some("table");

        match &header {
            Some(columns) if !is_header => {
                let row: Row = columns
                    .iter()
                    .zip(record.iter())
                    .filter(|(name, _)| !name.is_empty())
                    .map(|(name, value)| (name.clone(), value.to_string()))
                    .collect();
                rows.push(row);
            }
            _ => header = Some(record.iter().map(str::to_string).collect()),
        }
    }

    Ok(rows)
}
