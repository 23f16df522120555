//! Lookup translation
//!
//! Maps a `(field, lookup, value)` comparison onto a Flux predicate
//! expression over the record `r`.

use crate::query::ast::{Lookup, Value};
use crate::query::error::{QueryError, QueryResult};
use crate::query::literal::{quote, render};

/// Flux comparator for a lookup, if it has one
pub fn flux_operator(lookup: &Lookup) -> Option<&'static str> {
    match lookup {
        Lookup::Exact => Some("=="),
        Lookup::Gt => Some(">"),
        Lookup::Gte => Some(">="),
        Lookup::Lt => Some("<"),
        Lookup::Lte => Some("<="),
        Lookup::Contains | Lookup::IContains => Some("=~"),
        _ => None,
    }
}

/// Record column reference, e.g. `r["device"]`
pub fn column(field: &str) -> String {
    format!("r[{}]", quote(field))
}

/// Translate one comparison into a Flux boolean expression.
///
/// `contains`/`icontains` insert the value as a raw regex body.
pub fn translate(field: &str, lookup: &Lookup, value: &Value) -> QueryResult<String> {
    let op = flux_operator(lookup)
        .ok_or_else(|| QueryError::UnsupportedLookup(lookup.name().to_string()))?;

    let rhs = match lookup {
        Lookup::Contains | Lookup::IContains => format!("/{}/", regex_body(value)),
        _ => render(value),
    };

    Ok(format!("{} {} {}", column(field), op, rhs))
}

fn regex_body(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => render(other),
    }
}
