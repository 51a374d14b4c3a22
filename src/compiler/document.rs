//! Document-store compiler - lowers a filter AST into a MongoDB-style
//! key/value filter map
//!
//! Negation wraps individual operator maps in `$not` (or swaps the operator
//! where a dual exists, `$in`/`$nin`); logical containers De Morgan into the
//! dual container. `= null` compiles to an `$exists` check rather than a
//! null comparison.
//!
//! Note on negated patterns: MongoDB proper only accepts a BSON regex inside
//! `$not`, not the `{"$regex": ...}` operator form emitted here. A caller
//! driving real MongoDB must convert the `$regex` string to its driver's
//! regex value before sending `!like`/`!ilike` filters.

use crate::ast::{ComparisonOperator, Expression};
use crate::compiler::{comparison_field, literal_value};
use crate::error::{Error, Result};
use serde_json::{json, Value};
use tracing::trace;

const BACKEND: &str = "document";

/// Compile a filter expression into a document-store filter map
pub fn compile(expr: &Expression, negative: bool) -> Result<Value> {
    trace!(filter = %expr, negative, "compiling filter for document store");
    compile_expr(expr, negative)
}

fn compile_expr(expr: &Expression, negative: bool) -> Result<Value> {
    match expr {
        Expression::Literal(literal) => Ok(literal_value(literal)),

        Expression::Identifier(id) => Ok(Value::String(id.path().to_string())),

        Expression::Array { items } => {
            let items = items
                .iter()
                .map(|item| compile_expr(item, false))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(
                items.into_iter().filter(|v| !v.is_null()).collect(),
            ))
        }

        Expression::Negative { expression } => compile_expr(expression, !negative),

        Expression::Parenthesized { expression } => compile_expr(expression, negative),

        Expression::Logical { op, items } => {
            let effective = if negative { op.flipped() } else { *op };
            let key = match effective {
                crate::ast::LogicalOperator::And => "$and",
                crate::ast::LogicalOperator::Or => "$or",
            };
            let compiled = items
                .iter()
                .map(|item| compile_expr(item, negative))
                .collect::<Result<Vec<_>>>()?;
            Ok(json!({ key: compiled }))
        }

        Expression::Comparison { left, op, right } => {
            compile_comparison(left, *op, right, negative)
        }

        Expression::Arithmetic { .. } => Err(Error::not_implemented(
            BACKEND,
            "arithmetic expression in a document-store filter",
        )),
    }
}

fn compile_comparison(
    left: &Expression,
    op: ComparisonOperator,
    right: &Expression,
    negative: bool,
) -> Result<Value> {
    use ComparisonOperator::*;

    let field = comparison_field(left).ok_or_else(|| {
        Error::InvalidFilter("Left side of a comparison must be a data field".into())
    })?;
    let value = compile_expr(right, false)?;

    // A null right-hand side is an existence check, not a value match.
    if value.is_null() && matches!(op, Eq | Ne) {
        let exists = (op == Ne) != negative;
        return Ok(json!({ field: { "$exists": exists } }));
    }

    match op {
        Eq => {
            if negative {
                Ok(json!({ field: { "$ne": value } }))
            } else {
                Ok(json!({ field: value }))
            }
        }
        Ne => {
            if negative {
                Ok(json!({ field: value }))
            } else {
                Ok(json!({ field: { "$ne": value } }))
            }
        }
        Gt | Ge | Lt | Le => {
            let key = match op {
                Gt => "$gt",
                Ge => "$gte",
                Lt => "$lt",
                _ => "$lte",
            };
            let range = json!({ key: value });
            if negative {
                Ok(json!({ field: { "$not": range } }))
            } else {
                Ok(json!({ field: range }))
            }
        }
        In | NotIn => {
            if !value.is_array() {
                return Err(Error::InvalidFilter(
                    "Right side of 'in' must be an array".into(),
                ));
            }
            let membership = (op == In) != negative;
            let key = if membership { "$in" } else { "$nin" };
            Ok(json!({ field: { key: value } }))
        }
        Like | NotLike | ILike | NotILike => {
            let Value::String(pattern) = value else {
                return Err(Error::InvalidFilter(format!(
                    "Pattern for '{}' must be a string",
                    op
                )));
            };
            let mismatch = matches!(op, NotLike | NotILike) != negative;
            let mut matcher = json!({ "$regex": like_to_regex(&pattern) });
            if matches!(op, ILike | NotILike) {
                matcher["$options"] = Value::String("i".into());
            }
            if mismatch {
                Ok(json!({ field: { "$not": matcher } }))
            } else {
                Ok(json!({ field: matcher }))
            }
        }
    }
}

/// Translate a like pattern (`%` any run, `_` one character) into an
/// anchored regex string for `$regex`
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^'
            | '$' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out.push('$');
    out
}
