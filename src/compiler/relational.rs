//! Relational compiler - lowers a filter AST into a parameterized SQL
//! predicate fragment
//!
//! Emits Postgres-style `$n` placeholders with a bind-value list; the ORM
//! layer embeds the fragment into a full statement (pagination, projection
//! and sort are added separately). Null comparisons become `IS NULL` /
//! `IS NOT NULL`; range negation wraps in `NOT (...)`; `ilike` maps to the
//! native `ILIKE` operator.

use crate::ast::{ArithmeticOperator, ComparisonOperator, Expression, Literal, LogicalOperator};
use crate::compiler::comparison_field;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::fmt::Write;
use tracing::trace;

const BACKEND: &str = "relational";

/// A typed bind value for a SQL predicate
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    Number(Decimal),
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// A SQL predicate fragment with positional bind parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Compile a filter expression into a parameterized SQL predicate
pub fn compile(expr: &Expression, negative: bool) -> Result<SqlPredicate> {
    trace!(filter = %expr, negative, "compiling filter for relational store");
    let mut builder = SqlBuilder::default();
    builder.write_predicate(expr, negative)?;
    Ok(SqlPredicate {
        sql: builder.sql,
        params: builder.params,
    })
}

#[derive(Default)]
struct SqlBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlBuilder {
    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    /// Append a bind value and write its `$n` placeholder
    fn bind(&mut self, value: SqlValue) {
        self.params.push(value);
        let _ = write!(self.sql, "${}", self.params.len());
    }

    /// Write a dotted field path as quoted identifiers
    fn push_column(&mut self, path: &str) {
        for (i, segment) in path.split('.').enumerate() {
            if i > 0 {
                self.sql.push('.');
            }
            let _ = write!(self.sql, "\"{}\"", segment);
        }
    }

    fn write_predicate(&mut self, expr: &Expression, negative: bool) -> Result<()> {
        match expr {
            Expression::Logical { op, items } => {
                let effective = if negative { op.flipped() } else { *op };
                let joiner = match effective {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };
                self.push("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(joiner);
                    }
                    self.write_predicate(item, negative)?;
                }
                self.push(")");
                Ok(())
            }

            Expression::Negative { expression } => self.write_predicate(expression, !negative),

            Expression::Parenthesized { expression } => self.write_predicate(expression, negative),

            Expression::Comparison { left, op, right } => {
                self.write_comparison(left, *op, right, negative)
            }

            Expression::Literal(_)
            | Expression::Identifier(_)
            | Expression::Array { .. }
            | Expression::Arithmetic { .. } => Err(Error::not_implemented(
                BACKEND,
                format!("expression '{}' cannot be compiled as a predicate", expr),
            )),
        }
    }

    fn write_comparison(
        &mut self,
        left: &Expression,
        op: ComparisonOperator,
        right: &Expression,
        negative: bool,
    ) -> Result<()> {
        use ComparisonOperator::*;

        let field = comparison_field(left)
            .ok_or_else(|| {
                Error::InvalidFilter("Left side of a comparison must be a data field".into())
            })?
            .to_string();

        // Null comparisons become existence predicates.
        if is_null_literal(right) && matches!(op, Eq | Ne) {
            let exists = (op == Ne) != negative;
            self.push_column(&field);
            self.push(if exists { " IS NOT NULL" } else { " IS NULL" });
            return Ok(());
        }

        match op {
            Eq | Ne => {
                let equal = (op == Eq) != negative;
                self.push_column(&field);
                self.push(if equal { " = " } else { " <> " });
                self.write_scalar(right)
            }
            Gt | Ge | Lt | Le => {
                if negative {
                    self.push("NOT (");
                }
                self.push_column(&field);
                self.push(match op {
                    Gt => " > ",
                    Ge => " >= ",
                    Lt => " < ",
                    _ => " <= ",
                });
                self.write_scalar(right)?;
                if negative {
                    self.push(")");
                }
                Ok(())
            }
            In | NotIn => {
                let membership = (op == In) != negative;
                self.write_membership(&field, right, membership)
            }
            Like | NotLike | ILike | NotILike => {
                let mismatch = matches!(op, NotLike | NotILike) != negative;
                self.push_column(&field);
                self.push(if mismatch { " NOT " } else { " " });
                self.push(if matches!(op, ILike | NotILike) {
                    "ILIKE "
                } else {
                    "LIKE "
                });
                self.write_scalar(right)
            }
        }
    }

    fn write_membership(
        &mut self,
        field: &str,
        right: &Expression,
        membership: bool,
    ) -> Result<()> {
        let Some(items) = array_items(right) else {
            return Err(Error::InvalidFilter(
                "Right side of 'in' must be an array".into(),
            ));
        };
        let items: Vec<&Expression> = items
            .iter()
            .filter(|item| !is_null_literal(item))
            .collect();

        // IN over an empty set matches nothing; NOT IN matches everything.
        if items.is_empty() {
            self.push(if membership { "FALSE" } else { "TRUE" });
            return Ok(());
        }

        self.push_column(field);
        self.push(if membership { " IN (" } else { " NOT IN (" });
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.write_scalar(item)?;
        }
        self.push(")");
        Ok(())
    }

    /// Write a value-position expression: a bind parameter, column reference
    /// or arithmetic chain
    fn write_scalar(&mut self, expr: &Expression) -> Result<()> {
        match expr {
            Expression::Literal(literal) => {
                match literal {
                    Literal::Null => self.push("NULL"),
                    Literal::Number(n) => self.bind(SqlValue::Number(*n)),
                    Literal::String(s) => self.bind(SqlValue::Text(s.clone())),
                    Literal::Boolean(b) => self.bind(SqlValue::Bool(*b)),
                    Literal::Date(d) => self.bind(SqlValue::Date(*d)),
                    Literal::Time(t) => self.bind(SqlValue::Time(*t)),
                }
                Ok(())
            }
            Expression::Identifier(id) => {
                self.push_column(id.path());
                Ok(())
            }
            Expression::Parenthesized { expression } => {
                self.push("(");
                self.write_scalar(expression)?;
                self.push(")");
                Ok(())
            }
            Expression::Arithmetic { items } => {
                self.push("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(match item.operator {
                            ArithmeticOperator::Add => " + ",
                            ArithmeticOperator::Sub => " - ",
                            ArithmeticOperator::Mul => " * ",
                            ArithmeticOperator::Div => " / ",
                        });
                    }
                    self.write_scalar(&item.expression)?;
                }
                self.push(")");
                Ok(())
            }
            other => Err(Error::not_implemented(
                BACKEND,
                format!("expression '{}' cannot be compiled as a value", other),
            )),
        }
    }
}

fn is_null_literal(expr: &Expression) -> bool {
    match expr {
        Expression::Literal(Literal::Null) => true,
        Expression::Parenthesized { expression } => is_null_literal(expression),
        _ => false,
    }
}

fn array_items(expr: &Expression) -> Option<&[Expression]> {
    match expr {
        Expression::Array { items } => Some(items),
        Expression::Parenthesized { expression } => array_items(expression),
        _ => None,
    }
}
