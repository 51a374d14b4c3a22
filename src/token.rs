//! Token types for the filter lexer
//!
//! Tokens represent the lexical elements of filter expressions.

/// Token types for the filter lexer
#[derive(Debug, PartialEq, Clone, Eq)]
pub enum TokenType {
    // Literals
    StringLiteral,
    NumberLiteral,

    // Identifiers
    Identifier,

    // Keywords (case-insensitive)
    True,
    False,
    Null,
    And,
    Or,
    Not,
    In,
    Like,
    ILike,

    // Operators
    Equal,              // =
    NotEqual,           // !=
    GreaterThan,        // >
    GreaterThanOrEqual, // >=
    LessThan,           // <
    LessThanOrEqual,    // <=
    NotIn,              // !in
    NotLike,            // !like
    NotILike,           // !ilike
    Bang,               // ! (logical not)
    Plus,               // +
    Minus,              // -
    Multiply,           // *
    Divide,             // /

    // Delimiters
    Dot,          // .
    Comma,        // ,
    OpenParen,    // (
    CloseParen,   // )
    OpenBracket,  // [
    CloseBracket, // ]

    // End of input
    Eof,

    // Error
    Error, // For syntax errors
}

/// A token in the filter expression
#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value,
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Eof,
            value: String::new(),
            position,
            line,
            column,
        }
    }

    pub fn error(message: String, position: usize, line: usize, column: usize) -> Self {
        Self {
            token_type: TokenType::Error,
            value: message,
            position,
            line,
            column,
        }
    }
}
