//! Flux literal rendering
//!
//! Renders scalar values into Flux source text. Strings are double-quoted
//! with backslash and quote escaped; timestamps are normalized to UTC and
//! written as bare RFC 3339 time literals.

use crate::query::ast::Value;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};

/// Naive datetime layouts accepted when a time bound arrives as text
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Render a value as a Flux literal
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => render_float(*f),
        Value::Str(s) => quote(s),
        Value::DateTime(dt) => format_datetime(dt),
        Value::NaiveDateTime(dt) => format_naive(dt),
    }
}

/// Double-quote a string, escaping `\` and `"`
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a value used as a `range()` bound.
///
/// Timestamps and strings that parse as datetimes are normalized to UTC.
/// Other strings pass through raw so relative durations like `-1h` work.
/// `Null` is no bound at all.
pub fn render_time_bound(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Str(s) => Some(match parse_datetime(s) {
            Some(dt) => format_datetime(&dt),
            None => s.clone(),
        }),
        other => Some(render(other)),
    }
}

/// Normalize a zoned timestamp to UTC, e.g. `2024-05-01T12:00:00+00:00`
pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Render a naive timestamp, assuming it is already UTC
pub fn format_naive(dt: &NaiveDateTime) -> String {
    dt.and_utc().to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Parse RFC 3339 or a naive `YYYY-MM-DD HH:MM:SS` datetime (assumed UTC)
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

// Flux reads `1` as an int; keep a fractional part so float columns compare.
// NaN and infinities have no literal form and go through `float()`.
fn render_float(f: f64) -> String {
    if f.is_nan() {
        return r#"float(v: "NaN")"#.to_string();
    }
    if f.is_infinite() {
        let sign = if f > 0.0 { '+' } else { '-' };
        return format!(r#"float(v: "{}Inf")"#, sign);
    }
    let s = f.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}
