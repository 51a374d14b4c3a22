//! Backend compilers - lower a normalized AST into native query fragments
//!
//! Three structurally parallel compilers share the same dispatch shape: a
//! single exhaustive `match` per entry point, recursing with an accumulating
//! `negative` flag. Negation is never rewritten eagerly into a generic NOT
//! wrapper; each operator implementation picks its negated form instead,
//! because not every backend DSL negates every predicate kind uniformly
//! (existence checks in particular). `Logical(and)` under negation becomes
//! the backend's "or of negated items" and vice versa (De Morgan).
//!
//! Unsupported operator/node combinations fail fast with
//! [`Error::NotImplemented`](crate::error::Error::NotImplemented); a
//! predicate is never silently dropped.

pub mod document;
pub mod relational;
pub mod search;

use crate::ast::{Expression, Literal};
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

/// Extract the field path of a comparison's left-hand side.
///
/// Sees through explicit grouping; anything but an identifier is a
/// normalizer invariant violation.
pub(crate) fn comparison_field(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::Identifier(id) => Some(id.path()),
        Expression::Parenthesized { expression } => comparison_field(expression),
        _ => None,
    }
}

/// Convert a typed literal to its JSON representation (document-store and
/// search-engine backends)
pub(crate) fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => {
            if n.is_integer() {
                n.to_i64()
                    .map(|i| Value::Number(i.into()))
                    .unwrap_or(Value::Null)
            } else {
                n.to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Literal::String(s) => Value::String(s.clone()),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        Literal::Time(t) => Value::String(t.format("%H:%M:%S%.3f").to_string()),
    }
}
