//! Flux Pipeline Compiler
//!
//! Assembles a [`QueryDescriptor`] into a Flux query, one stage per line:
//!
//! ```text
//! from → range → filter(_measurement) → filter(...)* → keep → sort → limit
//! ```
//!
//! `range()` is always emitted; without explicit bounds it falls back to
//! [`DEFAULT_LOOKBACK`]. Compilation is a pure function of the descriptor.

use crate::query::ast::{QueryDescriptor, Value};
use crate::query::error::{QueryError, QueryResult};
use crate::query::literal::quote;
use crate::query::walker::{walk, WalkResult};
use std::fmt;

/// Bucket used when the descriptor names none
pub const DEFAULT_BUCKET: &str = "default";

/// Range start used when no time bound was given
pub const DEFAULT_LOOKBACK: &str = "-30d";

/// Placeholder token substituted by [`crate::client::Cursor::execute`]
pub const PLACEHOLDER: &str = "%s";

/// A compiled Flux query.
///
/// Literals are embedded directly, so `params` is always empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub flux: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    pub fn as_str(&self) -> &str {
        &self.flux
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flux)
    }
}

/// Compile a query descriptor into Flux
pub fn compile(query: &QueryDescriptor) -> QueryResult<CompiledQuery> {
    let walked = walk(query.predicate.as_ref())?;
    let flux = assemble(query, &walked);
    tracing::debug!(measurement = %query.measurement, "compiled flux:\n{}", flux);
    Ok(CompiledQuery {
        flux,
        params: Vec::new(),
    })
}

/// Emit the pipeline stages for a walked descriptor
pub fn assemble(query: &QueryDescriptor, walked: &WalkResult) -> String {
    let bucket = query.bucket.as_deref().unwrap_or(DEFAULT_BUCKET);
    let mut stages = vec![format!("from(bucket: {})", quote(bucket))];

    stages.push(range_stage(walked.start.as_deref(), walked.stop.as_deref()));

    stages.push(format!(
        r#"|> filter(fn: (r) => r["_measurement"] == {})"#,
        quote(&query.measurement)
    ));
    for fragment in &walked.fragments {
        stages.push(format!("|> filter(fn: (r) => {})", fragment));
    }

    if !query.columns.is_empty() {
        stages.push(format!("|> keep(columns: [{}])", column_list(&query.columns)));
    }

    if !query.ordering.is_empty() {
        let columns: Vec<&str> = query.ordering.iter().map(|o| o.column.as_str()).collect();
        // One direction for the whole sort; any descending column wins
        let desc = query.ordering.iter().any(|o| o.descending);
        stages.push(format!(
            "|> sort(columns: [{}], desc: {})",
            column_list(&columns),
            desc
        ));
    }

    if let Some(stage) = limit_stage(query.low_mark, query.high_mark) {
        stages.push(stage);
    }

    stages.join("\n")
}

fn range_stage(start: Option<&str>, stop: Option<&str>) -> String {
    if start.is_none() && stop.is_none() {
        return format!("|> range(start: {})", DEFAULT_LOOKBACK);
    }
    let mut args = Vec::with_capacity(2);
    if let Some(start) = start {
        args.push(format!("start: {}", start));
    }
    if let Some(stop) = stop {
        args.push(format!("stop: {}", stop));
    }
    format!("|> range({})", args.join(", "))
}

fn limit_stage(low: Option<u64>, high: Option<u64>) -> Option<String> {
    let high = high?;
    let low = low.unwrap_or(0);
    let n = high.saturating_sub(low);
    Some(match low {
        0 => format!("|> limit(n: {})", n),
        _ => format!("|> limit(n: {}, offset: {})", n, low),
    })
}

fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Date-part extraction has no pipeline equivalent
pub fn date_extract(part: &str, field: &str) -> QueryResult<String> {
    Err(QueryError::UnsupportedOperation(format!(
        "date extraction ({} of {})",
        part, field
    )))
}
