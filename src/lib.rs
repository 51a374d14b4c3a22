//! Query-filter expression engine
//!
//! A small textual query language (`field=value and (other>5 or other<1)`)
//! used to filter collection reads, deletes and updates, processed in three
//! stages:
//! 1. **Parser** → AST (typed, immutable)
//! 2. **Normalizer** → bound AST (schema fields resolved, operator whitelist
//!    enforced)
//! 3. **Backend compiler** → native query fragment
//!
//! # Architecture Overview
//!
//! ```text
//! Filter String
//!      |
//!   Parser -> AST
//!      |
//! Normalizer (FilterRules + DataType) -> bound AST
//!      |
//!      +-> document compiler   -> key/value filter map (MongoDB-style)
//!      +-> relational compiler -> parameterized SQL predicate
//!      +-> search compiler     -> bool/must/range DSL (Elasticsearch-style)
//! ```
//!
//! The whole pipeline is synchronous, pure tree recursion with no I/O; the
//! [`FilterRules`] registry and [`DataType`] metadata are read-only after
//! construction, so concurrent requests share them without locking.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod normalizer;
pub mod parser;
pub mod printer;
pub mod rules;
pub mod schema;
mod temporal;
pub mod token;

// Re-export main types
pub use ast::{
    ArithmeticItem, ArithmeticOperator, ComparisonOperator, Expression, FieldBinding, Literal,
    LogicalOperator, QualifiedIdentifier, Sign,
};
pub use compiler::relational::{SqlPredicate, SqlValue};
pub use error::{Error, Result};
pub use normalizer::{normalize_filter, FilterSource, Normalizer};
pub use parser::parse;
pub use printer::stringify;
pub use rules::{parse_operator_set, FilterRule, FilterRules};
pub use schema::{absorb_parents, DataType, Field};
