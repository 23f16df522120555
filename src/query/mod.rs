//! Flux Query Compiler
//!
//! Translates relational-style query descriptors into Flux pipelines:
//!
//! - **AST**: Predicate tree, lookups, values and the query descriptor
//! - **Literal**: Flux literal rendering
//! - **Lookup**: Relational lookup → Flux comparator translation
//! - **Walker**: Predicate tree walk with time-bound promotion
//! - **Compiler**: Stage assembly
//!
//! # Pipeline Shape
//!
//! ```text
//! from(bucket: "b")
//! |> range(start: ..., stop: ...)
//! |> filter(fn: (r) => r["_measurement"] == "m")
//! |> filter(fn: (r) => ...)
//! |> keep(columns: [...])
//! |> sort(columns: [...], desc: ...)
//! |> limit(n: ..., offset: ...)
//! ```
//!
//! # Example
//!
//! ```rust
//! use fluxql::query::{compile, Query};
//!
//! let query = Query::measurement("temperature")
//!     .bucket("example-bucket")
//!     .filter_lookup("time__gte", "-1h")
//!     .filter_lookup("device", "sensor-1")
//!     .slice(5, 10)
//!     .build();
//!
//! let compiled = compile(&query).unwrap();
//! assert!(compiled.flux.contains("|> range(start: -1h)"));
//! assert!(compiled.flux.ends_with("|> limit(n: 5, offset: 5)"));
//! ```

mod ast;
mod compiler;
mod error;
mod literal;
mod lookup;
mod walker;

pub use ast::{
    is_time_field, split_lookup_key, Connector, Lookup, OrderBy, Predicate, Query, QueryBuilder,
    QueryDescriptor, Value, TIME_FIELDS,
};
pub use compiler::{
    assemble, compile, date_extract, CompiledQuery, DEFAULT_BUCKET, DEFAULT_LOOKBACK, PLACEHOLDER,
};
pub use error::{QueryError, QueryResult};
pub use literal::{parse_datetime, quote, render, render_time_bound};
pub use lookup::{flux_operator, translate};
pub use walker::{walk, WalkResult};
