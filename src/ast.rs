//! Abstract Syntax Tree (AST) representation
//!
//! The AST mirrors the filter grammar structure directly, without semantic
//! analysis. It is a closed sum type: the parser, normalizer and every
//! backend compiler dispatch over it with a single exhaustive `match`, so a
//! new node kind is a compile-time-checked omission rather than a silent
//! fallthrough.
//!
//! Trees are immutable once built. Normalization produces a new tree with
//! identifier bindings attached; it never mutates parser output in place.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

/// AST node representing a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A typed scalar value
    Literal(Literal),

    /// Dotted field path, optionally signed, optionally bound to a schema field
    Identifier(QualifiedIdentifier),

    /// Comparison: left op right
    Comparison {
        left: Box<Expression>,
        op: ComparisonOperator,
        right: Box<Expression>,
    },

    /// Logical combination: item (and|or) item (and|or) item ...
    ///
    /// `items` always holds at least two entries; the parser unwraps a
    /// single child instead of building this node.
    Logical {
        op: LogicalOperator,
        items: Vec<Expression>,
    },

    /// Flat arithmetic chain inside an operand: expr (+|-|*|/) expr ...
    ///
    /// The first item always carries [`ArithmeticOperator::Add`].
    Arithmetic { items: Vec<ArithmeticItem> },

    /// Array literal: '[' expression (',' expression)* ']'
    Array { items: Vec<Expression> },

    /// Parenthesized expression: '(' expression ')'
    ///
    /// Kept as an explicit node so grouping survives for round-trip
    /// printing; compilers see through it.
    Parenthesized { expression: Box<Expression> },

    /// Logical NOT: ('not' | '!') expression
    ///
    /// The normalizer recurses through it untouched; compilers carry it as
    /// an accumulating negation flag (De Morgan by flag).
    Negative { expression: Box<Expression> },
}

/// A parsed, typed scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Decimal),
    String(String),
    Boolean(bool),
    Null,
    /// ISO-8601 date (YYYY-MM-DD), recognized inside string literals at parse time
    Date(NaiveDate),
    /// ISO-8601 time (HH:MM:SS[.mmm]), recognized inside string literals at parse time
    Time(NaiveTime),
}

/// Dotted field path: identifier ('.' identifier)*
///
/// `sign` is only meaningful in field-selection contexts (pick/omit/sort);
/// filters ignore it. `binding` is `None` on parser output and attached by
/// the normalizer once the path resolves against a data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedIdentifier {
    pub value: String,
    pub sign: Option<Sign>,
    pub binding: Option<FieldBinding>,
}

impl QualifiedIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            sign: None,
            binding: None,
        }
    }

    pub fn signed(value: impl Into<String>, sign: Sign) -> Self {
        Self {
            value: value.into(),
            sign: Some(sign),
            binding: None,
        }
    }

    /// Path segments of the raw identifier value
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.value.split('.')
    }

    /// Canonical dotted path: the bound path when resolved, the raw value otherwise
    pub fn path(&self) -> &str {
        self.binding
            .as_ref()
            .map(|b| b.path.as_str())
            .unwrap_or(&self.value)
    }
}

/// Resolved schema information attached to an identifier by the normalizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Canonical dotted path with every segment in its declared casing
    pub path: String,
    /// Canonical name of the leaf field
    pub field: String,
    /// Name of the leaf field's complex data type, if it has one
    pub data_type: Option<String>,
}

/// Identifier sign: '+' | '-'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,  // +
    Minus, // -
}

/// Comparison operator: '=' | '!=' | '>' | '>=' | '<' | '<=' | 'in' | '!in'
/// | 'like' | '!like' | 'ilike' | '!ilike'
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum ComparisonOperator {
    #[serde(rename = "=")]
    Eq, // =
    #[serde(rename = "!=")]
    Ne, // !=
    #[serde(rename = ">")]
    Gt, // >
    #[serde(rename = ">=")]
    Ge, // >=
    #[serde(rename = "<")]
    Lt, // <
    #[serde(rename = "<=")]
    Le, // <=
    #[serde(rename = "in")]
    In, // in
    #[serde(rename = "!in")]
    NotIn, // !in
    #[serde(rename = "like")]
    Like, // like
    #[serde(rename = "!like")]
    NotLike, // !like
    #[serde(rename = "ilike")]
    ILike, // ilike
    #[serde(rename = "!ilike")]
    NotILike, // !ilike
}

impl ComparisonOperator {
    /// The operator's surface form in the filter grammar
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "!in",
            ComparisonOperator::Like => "like",
            ComparisonOperator::NotLike => "!like",
            ComparisonOperator::ILike => "ilike",
            ComparisonOperator::NotILike => "!ilike",
        }
    }
}

impl std::str::FromStr for ComparisonOperator {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "=" => Ok(ComparisonOperator::Eq),
            "!=" => Ok(ComparisonOperator::Ne),
            ">" => Ok(ComparisonOperator::Gt),
            ">=" => Ok(ComparisonOperator::Ge),
            "<" => Ok(ComparisonOperator::Lt),
            "<=" => Ok(ComparisonOperator::Le),
            "in" => Ok(ComparisonOperator::In),
            "!in" => Ok(ComparisonOperator::NotIn),
            "like" => Ok(ComparisonOperator::Like),
            "!like" => Ok(ComparisonOperator::NotLike),
            "ilike" => Ok(ComparisonOperator::ILike),
            "!ilike" => Ok(ComparisonOperator::NotILike),
            other => Err(crate::error::Error::InvalidFilter(format!(
                "Unknown comparison operator: '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator: 'and' | 'or'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And, // and
    Or,  // or
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }

    /// The De Morgan dual: `and` <-> `or`
    pub fn flipped(&self) -> Self {
        match self {
            LogicalOperator::And => LogicalOperator::Or,
            LogicalOperator::Or => LogicalOperator::And,
        }
    }
}

/// Arithmetic operator: '+' | '-' | '*' | '/'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOperator {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
}

impl ArithmeticOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
        }
    }
}

/// One link of a flat arithmetic chain
#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticItem {
    pub operator: ArithmeticOperator,
    pub expression: Expression,
}

impl Expression {
    /// Shorthand for an unbound identifier node
    pub fn identifier(path: impl Into<String>) -> Self {
        Expression::Identifier(QualifiedIdentifier::new(path))
    }

    /// Shorthand for a comparison node
    pub fn comparison(left: Expression, op: ComparisonOperator, right: Expression) -> Self {
        Expression::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Shorthand for a logical NOT node
    pub fn negative(expression: Expression) -> Self {
        Expression::Negative {
            expression: Box::new(expression),
        }
    }

    /// Shorthand for an explicit grouping node
    pub fn parenthesized(expression: Expression) -> Self {
        Expression::Parenthesized {
            expression: Box::new(expression),
        }
    }
}
