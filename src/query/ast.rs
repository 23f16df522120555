//! Query Descriptor Types
//!
//! Defines the relational-style description of a query that the compiler
//! turns into a Flux pipeline: a predicate tree, a projection, an ordering
//! and pagination marks.
//!
//! # Example
//!
//! ```rust
//! use fluxql::query::{Predicate, Query};
//!
//! let query = Query::measurement("temperature")
//!     .bucket("example-bucket")
//!     .filter(Predicate::lookup("device", "sensor-1"))
//!     .order_by("-time")
//!     .values(&["device", "value"])
//!     .build();
//!
//! assert_eq!(query.measurement, "temperature");
//! ```

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Field names treated as the record timestamp
pub const TIME_FIELDS: [&str; 3] = ["_time", "time", "timestamp"];

/// Check whether a field name refers to the record timestamp
pub fn is_time_field(field: &str) -> bool {
    TIME_FIELDS.contains(&field)
}

/// How the children of a branch are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    /// Separator used when joining child fragments
    pub fn separator(&self) -> &'static str {
        match self {
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

/// A node of the boolean predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Conjunction or disjunction of child predicates
    Branch {
        connector: Connector,
        children: Vec<Predicate>,
    },
    /// A single `field <lookup> value` comparison
    Comparison {
        field: String,
        lookup: Lookup,
        value: Value,
    },
}

impl Predicate {
    /// Build a comparison node
    pub fn compare(field: impl Into<String>, lookup: Lookup, value: impl Into<Value>) -> Self {
        Self::Comparison {
            field: field.into(),
            lookup,
            value: value.into(),
        }
    }

    /// Build a comparison from a `field__lookup` key.
    ///
    /// A key without a lookup suffix is an `exact` match.
    pub fn lookup(key: &str, value: impl Into<Value>) -> Self {
        let (field, lookup) = split_lookup_key(key);
        Self::compare(field, lookup, value)
    }

    /// AND-combine the given predicates
    pub fn and(children: Vec<Predicate>) -> Self {
        Self::Branch {
            connector: Connector::And,
            children,
        }
    }

    /// OR-combine the given predicates
    pub fn or(children: Vec<Predicate>) -> Self {
        Self::Branch {
            connector: Connector::Or,
            children,
        }
    }

    /// True for a branch with no children at any depth
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Branch { children, .. } => children.iter().all(Predicate::is_empty),
            Self::Comparison { .. } => false,
        }
    }
}

/// Split `location__icontains` into (`location`, `icontains`)
pub fn split_lookup_key(key: &str) -> (&str, Lookup) {
    match key.rsplit_once("__") {
        Some((field, name)) if !field.is_empty() => (field, Lookup::from_name(name)),
        _ => (key, Lookup::Exact),
    }
}

/// Relational lookup operators.
///
/// Only a subset has a Flux equivalent; the rest are rejected by the
/// translator rather than approximated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    IExact,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    In,
    IsNull,
    Range,
    Regex,
    /// Any other lookup name, kept verbatim for error reporting
    Other(String),
}

impl Lookup {
    /// Parse from the relational lookup name
    pub fn from_name(name: &str) -> Self {
        match name {
            "exact" => Self::Exact,
            "iexact" => Self::IExact,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "contains" => Self::Contains,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            "in" => Self::In,
            "isnull" => Self::IsNull,
            "range" => Self::Range,
            "regex" => Self::Regex,
            other => Self::Other(other.to_string()),
        }
    }

    /// The relational lookup name
    pub fn name(&self) -> &str {
        match self {
            Self::Exact => "exact",
            Self::IExact => "iexact",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::In => "in",
            Self::IsNull => "isnull",
            Self::Range => "range",
            Self::Regex => "regex",
            Self::Other(name) => name,
        }
    }

    /// Lookups that open a time range (`gt`, `gte`)
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Self::Gt | Self::Gte)
    }

    /// Lookups that close a time range (`lt`, `lte`)
    pub fn is_upper_bound(&self) -> bool {
        matches!(self, Self::Lt | Self::Lte)
    }
}

impl FromStr for Lookup {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar values appearing on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Timestamp carrying an explicit offset
    DateTime(DateTime<FixedOffset>),
    /// Timestamp without zone information, interpreted as UTC
    NaiveDateTime(NaiveDateTime),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Self::DateTime(v.fixed_offset())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::NaiveDateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One requested sort column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }

    /// Parse the `-column` shorthand for descending order
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(column) => Self::desc(column.trim_start_matches('-')),
            None => Self::asc(spec),
        }
    }
}

/// Everything the compiler needs to produce one pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    /// Bucket to read from; `"default"` when absent
    pub bucket: Option<String>,
    /// Measurement the records belong to
    pub measurement: String,
    /// Root of the predicate tree
    pub predicate: Option<Predicate>,
    /// Projected columns, in output order
    pub columns: Vec<String>,
    /// Requested ordering
    pub ordering: Vec<OrderBy>,
    /// Pagination start offset
    pub low_mark: Option<u64>,
    /// Pagination end offset (exclusive)
    pub high_mark: Option<u64>,
}

/// Entry point for building descriptors
pub struct Query;

impl Query {
    /// Start building a query over a measurement
    pub fn measurement(name: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(name)
    }
}

/// Builder for constructing query descriptors programmatically
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    descriptor: QueryDescriptor,
    filters: Vec<Predicate>,
}

impl QueryBuilder {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            descriptor: QueryDescriptor {
                measurement: measurement.into(),
                ..QueryDescriptor::default()
            },
            filters: Vec::new(),
        }
    }

    /// Set the source bucket
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.descriptor.bucket = Some(bucket.into());
        self
    }

    /// Add a predicate; successive calls are AND-combined
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Add a `field__lookup = value` predicate
    pub fn filter_lookup(self, key: &str, value: impl Into<Value>) -> Self {
        self.filter(Predicate::lookup(key, value))
    }

    /// Project to the given columns
    pub fn values(mut self, columns: &[&str]) -> Self {
        self.descriptor.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Append a sort column; `-column` sorts descending
    pub fn order_by(mut self, spec: &str) -> Self {
        self.descriptor.ordering.push(OrderBy::parse(spec));
        self
    }

    /// Keep rows `low..high`
    pub fn slice(mut self, low: u64, high: u64) -> Self {
        self.descriptor.low_mark = Some(low);
        self.descriptor.high_mark = Some(high);
        self
    }

    /// Keep at most `n` rows
    pub fn limit(mut self, n: u64) -> Self {
        let low = self.descriptor.low_mark.unwrap_or(0);
        self.descriptor.high_mark = Some(low + n);
        self
    }

    /// Skip the first `n` rows
    pub fn offset(mut self, n: u64) -> Self {
        if let Some(high) = self.descriptor.high_mark {
            let count = high.saturating_sub(self.descriptor.low_mark.unwrap_or(0));
            self.descriptor.high_mark = Some(n + count);
        }
        self.descriptor.low_mark = Some(n);
        self
    }

    /// Build the descriptor
    pub fn build(mut self) -> QueryDescriptor {
        self.descriptor.predicate = match self.filters.len() {
            0 => None,
            _ => Some(Predicate::and(self.filters)),
        };
        self.descriptor
    }
}
