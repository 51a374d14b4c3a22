//! Search-engine compiler - lowers a filter AST into Elasticsearch-style
//! boolean query DSL
//!
//! The search DSL has no uniform negation wrapper: negated logical
//! containers flip `must` <-> `should` (De Morgan), while negated leaves
//! wrap in `bool.must_not`. `= null` compiles to an `exists` query because
//! the engine treats missing and null fields alike.

use crate::ast::{ComparisonOperator, Expression, LogicalOperator};
use crate::compiler::{comparison_field, literal_value};
use crate::error::{Error, Result};
use serde_json::{json, Value};
use tracing::trace;

const BACKEND: &str = "search";

/// Compile a filter expression into a search-engine bool query
pub fn compile(expr: &Expression, negative: bool) -> Result<Value> {
    trace!(filter = %expr, negative, "compiling filter for search engine");
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
            let compiled = items
                .iter()
                .map(|item| compile_expr(item, negative))
                .collect::<Result<Vec<_>>>()?;
            Ok(match effective {
                LogicalOperator::And => json!({ "bool": { "must": compiled } }),
                LogicalOperator::Or => json!({
                    "bool": { "should": compiled, "minimum_should_match": 1 }
                }),
            })
        }

        Expression::Comparison { left, op, right } => {
            compile_comparison(left, *op, right, negative)
        }

        Expression::Arithmetic { .. } => Err(Error::not_implemented(
            BACKEND,
            "arithmetic expression in a search query",
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

    // Null right-hand side: the engine has no null values, only missing
    // fields, so this is an existence query.
    if value.is_null() && matches!(op, Eq | Ne) {
        let exists = (op == Ne) != negative;
        let query = json!({ "exists": { "field": field } });
        return Ok(if exists { query } else { must_not(query) });
    }

    match op {
        Eq | Ne => {
            let equal = (op == Eq) != negative;
            let query = json!({ "term": { field: { "value": value } } });
            Ok(if equal { query } else { must_not(query) })
        }
        Gt | Ge | Lt | Le => {
            let key = match op {
                Gt => "gt",
                Ge => "gte",
                Lt => "lt",
                _ => "lte",
            };
            let query = json!({ "range": { field: { key: value } } });
            Ok(if negative { must_not(query) } else { query })
        }
        In | NotIn => {
            if !value.is_array() {
                return Err(Error::InvalidFilter(
                    "Right side of 'in' must be an array".into(),
                ));
            }
            let membership = (op == In) != negative;
            let query = json!({ "terms": { field: value } });
            Ok(if membership { query } else { must_not(query) })
        }
        Like | NotLike | ILike | NotILike => {
            let Value::String(pattern) = value else {
                return Err(Error::InvalidFilter(format!(
                    "Pattern for '{}' must be a string",
                    op
                )));
            };
            let mismatch = matches!(op, NotLike | NotILike) != negative;
            let mut body = json!({ "value": like_to_wildcard(&pattern) });
            if matches!(op, ILike | NotILike) {
                body["case_insensitive"] = Value::Bool(true);
            }
            let query = json!({ "wildcard": { field: body } });
            Ok(if mismatch { must_not(query) } else { query })
        }
    }
}

fn must_not(query: Value) -> Value {
    json!({ "bool": { "must_not": [query] } })
}

/// Translate a like pattern (`%` any run, `_` one character) into the
/// engine's wildcard syntax (`*` / `?`), escaping literal wildcards
fn like_to_wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => out.push('*'),
            '_' => out.push('?'),
            '*' | '?' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn compiled(input: &str) -> Value {
        compile(&parse(input).unwrap(), false).unwrap()
    }

    #[test]
    fn test_term_query() {
        assert_eq!(
            compiled("rate = 5"),
            json!({"term": {"rate": {"value": 5}}})
        );
        assert_eq!(
            compiled("rate != 5"),
            json!({"bool": {"must_not": [{"term": {"rate": {"value": 5}}}]}})
        );
    }

    #[test]
    fn test_range_query() {
        assert_eq!(
            compiled("rate > 5"),
            json!({"range": {"rate": {"gt": 5}}})
        );
        assert_eq!(
            compiled("not rate <= 1"),
            json!({"bool": {"must_not": [{"range": {"rate": {"lte": 1}}}]}})
        );
    }

    #[test]
    fn test_terms_query() {
        assert_eq!(
            compiled("status in [\"a\", \"b\"]"),
            json!({"terms": {"status": ["a", "b"]}})
        );
        assert_eq!(
            compiled("status !in [\"a\"]"),
            json!({"bool": {"must_not": [{"terms": {"status": ["a"]}}]}})
        );
    }

    #[test]
    fn test_terms_requires_array() {
        let err = compile(&parse("status in 5").unwrap(), false).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidFilter("Right side of 'in' must be an array".into())
        );
        assert!(compile(&parse("status !in \"a\"").unwrap(), false).is_err());
        assert_eq!(
            compiled("status in ([\"a\"])"),
            json!({"terms": {"status": ["a"]}})
        );
    }

    #[test]
    fn test_wildcard_query() {
        assert_eq!(
            compiled("name like \"Jo%n_\""),
            json!({"wildcard": {"name": {"value": "Jo*n?"}}})
        );
        assert_eq!(
            compiled("name ilike \"jo%\""),
            json!({"wildcard": {"name": {"value": "jo*", "case_insensitive": true}}})
        );
        assert_eq!(
            compiled("name !like \"a*b\""),
            json!({"bool": {"must_not": [{"wildcard": {"name": {"value": "a\\*b"}}}]}})
        );
    }

    #[test]
    fn test_null_as_existence() {
        // field = null: only documents without the field
        assert_eq!(
            compiled("tag = null"),
            json!({"bool": {"must_not": [{"exists": {"field": "tag"}}]}})
        );
        // field != null: only documents carrying the field
        assert_eq!(compiled("tag != null"), json!({"exists": {"field": "tag"}}));
        assert_eq!(
            compiled("not tag = null"),
            json!({"exists": {"field": "tag"}})
        );
    }

    #[test]
    fn test_bool_containers() {
        assert_eq!(
            compiled("a = 1 and b = 2"),
            json!({"bool": {"must": [
                {"term": {"a": {"value": 1}}},
                {"term": {"b": {"value": 2}}},
            ]}})
        );
        assert_eq!(
            compiled("a = 1 or b = 2"),
            json!({"bool": {
                "should": [
                    {"term": {"a": {"value": 1}}},
                    {"term": {"b": {"value": 2}}},
                ],
                "minimum_should_match": 1,
            }})
        );
    }

    #[test]
    fn test_de_morgan_flips_containers() {
        // not (A and B) == (not A) or (not B): must flips to should
        let negated = compiled("not (a = 1 and b = 2)");
        let expanded = compiled("(not a = 1) or (not b = 2)");
        assert_eq!(negated, expanded);
        assert_eq!(
            negated,
            json!({"bool": {
                "should": [
                    {"bool": {"must_not": [{"term": {"a": {"value": 1}}}]}},
                    {"bool": {"must_not": [{"term": {"b": {"value": 2}}}]}},
                ],
                "minimum_should_match": 1,
            }})
        );

        assert_eq!(
            compiled("not (a = 1 or b = 2)"),
            compiled("(not a = 1) and (not b = 2)")
        );
    }

    #[test]
    fn test_arithmetic_not_implemented() {
        let err = compile(&parse("rate > 1 + 2").unwrap(), false).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }));
    }
}
