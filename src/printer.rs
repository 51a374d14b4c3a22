//! Canonical text rendering for filter ASTs
//!
//! `stringify` produces a canonical, re-parseable textual form used for
//! logging and testing. For every valid filter string `s`,
//! `parse(&stringify(&parse(s)?))?` is structurally equal to `parse(s)?`:
//! explicit grouping survives because `Parenthesized` is its own node.

use crate::ast::{ArithmeticItem, Expression, Literal, Sign};
use std::fmt;

/// Render a filter AST back to canonical text
pub fn stringify(expr: &Expression) -> String {
    expr.to_string()
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(id) => {
                if let Some(sign) = id.sign {
                    let sign = match sign {
                        Sign::Plus => '+',
                        Sign::Minus => '-',
                    };
                    write!(f, "{}", sign)?;
                }
                f.write_str(id.path())
            }
            Expression::Comparison { left, op, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Expression::Logical { op, items } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.as_str())?;
                    }
                    // A bare logical child of the opposite operator only
                    // occurs in hand-built trees; parenthesize it so the
                    // output still reparses with the intended grouping.
                    if matches!(item, Expression::Logical { .. }) {
                        write!(f, "({})", item)?;
                    } else {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Expression::Arithmetic { items } => {
                for (i, ArithmeticItem { operator, expression }) in items.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", expression)?;
                    } else {
                        write!(f, " {} {}", operator.as_str(), expression)?;
                    }
                }
                Ok(())
            }
            Expression::Array { items } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Expression::Parenthesized { expression } => write!(f, "({})", expression),
            Expression::Negative { expression } => {
                if matches!(**expression, Expression::Logical { .. }) {
                    write!(f, "not ({})", expression)
                } else {
                    write!(f, "not {}", expression)
                }
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write_quoted(f, s),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
            // Quoted ISO forms reparse to the same typed literal.
            Literal::Date(d) => write!(f, "\"{}\"", d.format("%Y-%m-%d")),
            Literal::Time(t) => {
                if t.format("%.3f").to_string() == ".000" {
                    write!(f, "\"{}\"", t.format("%H:%M:%S"))
                } else {
                    write!(f, "\"{}\"", t.format("%H:%M:%S%.3f"))
                }
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{}", other)?,
        }
    }
    f.write_str("\"")
}
