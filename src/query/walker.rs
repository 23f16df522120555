//! Predicate tree walker
//!
//! Depth-first walk over the predicate tree that pulls time bounds out
//! into the `range()` stage and turns every other comparison into a
//! Flux filter expression.
//!
//! Only the first lower and first upper bound found on a time field are
//! promoted; later ones are consumed without tightening the range. Bounds
//! are promoted wherever they appear, including under an OR branch.

use crate::query::ast::{is_time_field, Connector, Lookup, Predicate, Value};
use crate::query::error::QueryResult;
use crate::query::literal::render_time_bound;
use crate::query::lookup::translate;

/// Output of walking a predicate tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    /// Rendered lower time bound
    pub start: Option<String>,
    /// Rendered upper time bound
    pub stop: Option<String>,
    /// Filter expressions, one per `filter()` stage
    pub fragments: Vec<String>,
}

/// Walk a predicate tree.
///
/// Children of an AND root become separate fragments; an OR root is
/// collapsed into one fragment so its semantics survive.
pub fn walk(root: Option<&Predicate>) -> QueryResult<WalkResult> {
    let mut walker = Walker::default();
    let fragments = match root {
        None => Vec::new(),
        Some(Predicate::Branch {
            connector: Connector::And,
            children,
        }) => {
            let mut fragments = Vec::new();
            for child in children {
                if let Some(fragment) = walker.visit(child)? {
                    fragments.push(fragment);
                }
            }
            fragments
        }
        Some(node) => walker.visit(node)?.into_iter().collect(),
    };

    Ok(WalkResult {
        start: walker.start,
        stop: walker.stop,
        fragments,
    })
}

#[derive(Default)]
struct Walker {
    start: Option<String>,
    stop: Option<String>,
}

impl Walker {
    fn visit(&mut self, node: &Predicate) -> QueryResult<Option<String>> {
        match node {
            Predicate::Branch {
                connector,
                children,
            } => {
                let mut parts = Vec::with_capacity(children.len());
                for child in children {
                    if let Some(part) = self.visit(child)? {
                        parts.push(part);
                    }
                }
                if parts.is_empty() {
                    return Ok(None);
                }
                Ok(Some(format!("({})", parts.join(connector.separator()))))
            }
            Predicate::Comparison {
                field,
                lookup,
                value,
            } => {
                if is_time_field(field) && self.promote(lookup, value) {
                    return Ok(None);
                }
                translate(field, lookup, value).map(Some)
            }
        }
    }

    /// Record a time bound; returns true when the comparison is consumed
    fn promote(&mut self, lookup: &Lookup, value: &Value) -> bool {
        let slot = if lookup.is_lower_bound() {
            &mut self.start
        } else if lookup.is_upper_bound() {
            &mut self.stop
        } else {
            return false;
        };
        // A null bound is consumed but leaves the slot open
        if slot.is_none() {
            *slot = render_time_bound(value);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::error::QueryError;

    fn cmp(key: &str, value: impl Into<Value>) -> Predicate {
        Predicate::lookup(key, value)
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(walk(None).unwrap(), WalkResult::default());
        assert_eq!(
            walk(Some(&Predicate::and(vec![]))).unwrap(),
            WalkResult::default()
        );
    }

    #[test]
    fn test_time_bounds_are_promoted() {
        let root = Predicate::and(vec![
            cmp("time__gte", "2024-05-01T12:00:00Z"),
            cmp("time__lt", "2024-05-01T14:00:00Z"),
            cmp("device", "sensor-1"),
        ]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(result.start.as_deref(), Some("2024-05-01T12:00:00+00:00"));
        assert_eq!(result.stop.as_deref(), Some("2024-05-01T14:00:00+00:00"));
        assert_eq!(result.fragments, vec![r#"r["device"] == "sensor-1""#]);
    }

    #[test]
    fn test_first_bound_wins() {
        let root = Predicate::and(vec![
            cmp("_time__gt", "-2h"),
            cmp("timestamp__gte", "-1h"),
            cmp("time__lte", "-5m"),
            cmp("time__lt", "-10m"),
        ]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(result.start.as_deref(), Some("-2h"));
        assert_eq!(result.stop.as_deref(), Some("-5m"));
        assert!(result.fragments.is_empty());
    }

    #[test]
    fn test_time_equality_is_a_filter() {
        let root = Predicate::and(vec![cmp("time", "2024-05-01T12:00:00Z")]);
        let result = walk(Some(&root)).unwrap();

        assert!(result.start.is_none());
        assert_eq!(result.fragments, vec![r#"r["time"] == "2024-05-01T12:00:00Z""#]);
    }

    #[test]
    fn test_nested_branches_are_parenthesized() {
        let root = Predicate::and(vec![
            Predicate::or(vec![cmp("device", "a"), cmp("device", "b")]),
            Predicate::and(vec![cmp("value__gt", 1), cmp("value__lt", 9)]),
        ]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(
            result.fragments,
            vec![
                r#"(r["device"] == "a" or r["device"] == "b")"#,
                r#"(r["value"] > 1 and r["value"] < 9)"#,
            ]
        );
    }

    #[test]
    fn test_empty_nested_branch_is_elided() {
        let root = Predicate::and(vec![
            Predicate::or(vec![Predicate::and(vec![])]),
            Predicate::or(vec![cmp("time__gte", "-1d")]),
            cmp("device", "a"),
        ]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(result.start.as_deref(), Some("-1d"));
        assert_eq!(result.fragments, vec![r#"r["device"] == "a""#]);
    }

    #[test]
    fn test_bound_under_or_is_still_promoted() {
        let root = Predicate::and(vec![Predicate::or(vec![
            cmp("time__gte", "-1d"),
            cmp("device", "a"),
        ])]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(result.start.as_deref(), Some("-1d"));
        assert_eq!(result.fragments, vec![r#"(r["device"] == "a")"#]);
    }

    #[test]
    fn test_or_root_stays_one_fragment() {
        let root = Predicate::or(vec![cmp("device", "a"), cmp("device", "b")]);
        let result = walk(Some(&root)).unwrap();

        assert_eq!(
            result.fragments,
            vec![r#"(r["device"] == "a" or r["device"] == "b")"#]
        );
    }

    #[test]
    fn test_bare_comparison_root() {
        let result = walk(Some(&cmp("device", "a"))).unwrap();
        assert_eq!(result.fragments, vec![r#"r["device"] == "a""#]);
    }

    #[test]
    fn test_null_time_bound_is_consumed() {
        let root = Predicate::and(vec![
            cmp("time__gte", Value::Null),
            cmp("time__lt", Value::Null),
            cmp("device", "a"),
        ]);
        let result = walk(Some(&root)).unwrap();

        assert!(result.start.is_none());
        assert!(result.stop.is_none());
        assert_eq!(result.fragments, vec![r#"r["device"] == "a""#]);

        let root = Predicate::and(vec![cmp("time__gte", Value::Null), cmp("time__gt", "-2h")]);
        let result = walk(Some(&root)).unwrap();
        assert_eq!(result.start.as_deref(), Some("-2h"));
    }

    #[test]
    fn test_unsupported_lookup_aborts_walk() {
        let root = Predicate::and(vec![
            cmp("device", "a"),
            Predicate::or(vec![cmp("device__startswith", "sen")]),
        ]);
        let err = walk(Some(&root)).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedLookup(ref name) if name == "startswith"));
    }

    #[test]
    fn test_unsupported_lookup_on_time_field() {
        let root = Predicate::and(vec![cmp("time__year", 2024)]);
        let err = walk(Some(&root)).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedLookup(ref name) if name == "year"));
    }
}
