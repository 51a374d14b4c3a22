//! Filter parser - converts string expressions to AST
//!
//! Recursive descent parser following the filter grammar precedence rules.
//! Precedence (lowest to highest):
//! 1. or
//! 2. and
//! 3. not / !
//! 4. comparison (=, !=, >, >=, <, <=, in, !in, like, !like, ilike, !ilike)
//! 5. arithmetic chain (+, -, *, /) — kept flat, no inner precedence
//! 6. term (literal, identifier path, array, parenthesized)
//!
//! ISO date and time literals are recognized inside string literals here, at
//! parse time, and turned into typed `Literal::Date` / `Literal::Time` nodes.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::temporal::{parse_date_literal, parse_time_literal};
use crate::token::{Token, TokenType};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parser for filter expressions
pub struct Parser {
    lexer: Lexer,
    current_token: Option<Token>,
    recursion_depth: usize,
}

const MAX_RECURSION_DEPTH: usize = 100;

/// Parse a filter string into an AST
pub fn parse(input: &str) -> Result<Expression> {
    Parser::new(input).parse()
}

impl Parser {
    /// Create a new parser for the given input string
    pub fn new(input: &str) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(input),
            current_token: None,
            recursion_depth: 0,
        };
        parser.advance();
        parser
    }

    /// Advance to the next token
    fn advance(&mut self) {
        self.current_token = Some(self.lexer.next_token());
    }

    /// Get the current token (if any)
    fn current_token(&self) -> Option<&Token> {
        self.current_token.as_ref()
    }

    /// Check if current token matches the given type
    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token()
            .map(|t| t.token_type == token_type)
            .unwrap_or(false)
    }

    /// Check if current token is one of the given types
    fn current_token_is_one_of(&self, types: &[TokenType]) -> bool {
        self.current_token()
            .map(|t| types.contains(&t.token_type))
            .unwrap_or(false)
    }

    /// Expect a specific token type and advance
    fn expect(&mut self, token_type: TokenType) -> Result<Token> {
        match self.current_token.take() {
            Some(token) if token.token_type == token_type => {
                self.advance();
                Ok(token)
            }
            Some(token) => Err(Error::Syntax(format!(
                "Expected {:?}, got '{}' at line {}, column {}",
                token_type, token.value, token.line, token.column
            ))),
            None => Err(Error::Syntax(format!(
                "Expected {:?}, but reached end of input",
                token_type
            ))),
        }
    }

    /// Syntax error for the current token
    fn unexpected(&self) -> Error {
        match self.current_token() {
            Some(token) if token.token_type == TokenType::Error => Error::Syntax(format!(
                "{} at line {}, column {}",
                token.value, token.line, token.column
            )),
            Some(token) if token.token_type == TokenType::Eof => {
                Error::Syntax("Unexpected end of input".into())
            }
            Some(token) => Error::Syntax(format!(
                "Unexpected token '{}' at line {}, column {}",
                token.value, token.line, token.column
            )),
            None => Error::Syntax("Unexpected end of input".into()),
        }
    }

    /// Parse the entire expression (top-level entry point)
    pub fn parse(&mut self) -> Result<Expression> {
        let expr = self.parse_or_expression()?;

        // Ensure we've consumed all input
        if !self.current_token_is(TokenType::Eof) {
            return Err(self.unexpected());
        }

        Ok(expr)
    }

    /// Check recursion depth and increment
    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(Error::Syntax(format!(
                "Expression too deeply nested (max depth: {})",
                MAX_RECURSION_DEPTH
            )));
        }
        Ok(())
    }

    /// Decrement recursion depth
    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    /// Parse or expression: expression 'or' expression
    ///
    /// Adjacent `or`s collect into one flat `Logical` node.
    fn parse_or_expression(&mut self) -> Result<Expression> {
        self.check_recursion_depth()?;
        let mut items = vec![self.parse_and_expression()?];

        while self.current_token_is(TokenType::Or) {
            self.advance(); // Skip 'or'
            items.push(self.parse_and_expression()?);
        }

        self.decrement_recursion_depth();
        if items.len() == 1 {
            Ok(items.pop().unwrap())
        } else {
            Ok(Expression::Logical {
                op: LogicalOperator::Or,
                items,
            })
        }
    }

    /// Parse and expression: expression 'and' expression
    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut items = vec![self.parse_not_expression()?];

        while self.current_token_is(TokenType::And) {
            self.advance(); // Skip 'and'
            items.push(self.parse_not_expression()?);
        }

        if items.len() == 1 {
            Ok(items.pop().unwrap())
        } else {
            Ok(Expression::Logical {
                op: LogicalOperator::And,
                items,
            })
        }
    }

    /// Parse not expression: ('not' | '!') expression
    fn parse_not_expression(&mut self) -> Result<Expression> {
        if self.current_token_is_one_of(&[TokenType::Not, TokenType::Bang]) {
            self.advance(); // Skip 'not'
            self.check_recursion_depth()?;
            let expression = self.parse_not_expression()?;
            self.decrement_recursion_depth();
            Ok(Expression::negative(expression))
        } else {
            self.parse_comparison_expression()
        }
    }

    /// Parse comparison expression: operand op operand
    ///
    /// A bare operand without an operator passes through unchanged (field
    /// lists for pick/omit/sort share this parser).
    fn parse_comparison_expression(&mut self) -> Result<Expression> {
        let left = self.parse_operand()?;

        let Some(op) = self
            .current_token()
            .and_then(|t| comparison_operator(&t.token_type))
        else {
            return Ok(left);
        };
        self.advance(); // Skip operator
        let right = self.parse_operand()?;

        Ok(Expression::comparison(left, op, right))
    }

    /// Parse an operand: a term, or a flat arithmetic chain of terms
    fn parse_operand(&mut self) -> Result<Expression> {
        let first = self.parse_term()?;

        if !self.current_token_is_one_of(&[
            TokenType::Plus,
            TokenType::Minus,
            TokenType::Multiply,
            TokenType::Divide,
        ]) {
            return Ok(first);
        }

        // The first link of the chain carries an implicit '+'.
        let mut items = vec![ArithmeticItem {
            operator: ArithmeticOperator::Add,
            expression: first,
        }];

        while let Some(op) = self
            .current_token()
            .and_then(|t| arithmetic_operator(&t.token_type))
        {
            self.advance(); // Skip operator
            items.push(ArithmeticItem {
                operator: op,
                expression: self.parse_term()?,
            });
        }

        Ok(Expression::Arithmetic { items })
    }

    /// Parse a term: literal, identifier path, array or parenthesized expression
    fn parse_term(&mut self) -> Result<Expression> {
        let Some(token) = self.current_token() else {
            return Err(Error::Syntax("Unexpected end of input".into()));
        };

        match token.token_type {
            TokenType::NumberLiteral => {
                let value = self.expect(TokenType::NumberLiteral)?.value;
                let number = Decimal::from_str(&value)
                    .map_err(|_| Error::Syntax(format!("Invalid number literal: {}", value)))?;
                Ok(Expression::Literal(Literal::Number(number)))
            }
            TokenType::StringLiteral => {
                let value = self.expect(TokenType::StringLiteral)?.value;
                Ok(Expression::Literal(string_literal(value)))
            }
            TokenType::True => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(Expression::Literal(Literal::Boolean(false)))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expression::Literal(Literal::Null))
            }
            TokenType::Identifier => {
                let path = self.parse_identifier_path()?;
                Ok(Expression::Identifier(QualifiedIdentifier::new(path)))
            }
            TokenType::Plus | TokenType::Minus => self.parse_signed_term(),
            TokenType::OpenParen => {
                self.expect(TokenType::OpenParen)?;
                self.check_recursion_depth()?;
                let expression = self.parse_or_expression()?;
                self.decrement_recursion_depth();
                self.expect(TokenType::CloseParen)?;
                Ok(Expression::parenthesized(expression))
            }
            TokenType::OpenBracket => self.parse_array(),
            _ => Err(self.unexpected()),
        }
    }

    /// Parse a signed term: ('+' | '-') (number | identifier)
    ///
    /// A sign before a number folds into the literal; a sign before an
    /// identifier is kept for field-selection contexts.
    fn parse_signed_term(&mut self) -> Result<Expression> {
        let is_minus = self.current_token_is(TokenType::Minus);
        self.advance(); // Skip sign

        let Some(token) = self.current_token() else {
            return Err(Error::Syntax("Unexpected end of input after sign".into()));
        };

        match token.token_type {
            TokenType::NumberLiteral => {
                let value = self.expect(TokenType::NumberLiteral)?.value;
                let number = Decimal::from_str(&value)
                    .map_err(|_| Error::Syntax(format!("Invalid number literal: {}", value)))?;
                let number = if is_minus { -number } else { number };
                Ok(Expression::Literal(Literal::Number(number)))
            }
            TokenType::Identifier => {
                let sign = if is_minus { Sign::Minus } else { Sign::Plus };
                let path = self.parse_identifier_path()?;
                Ok(Expression::Identifier(QualifiedIdentifier::signed(
                    path, sign,
                )))
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parse a dotted identifier path: identifier ('.' identifier)*
    fn parse_identifier_path(&mut self) -> Result<String> {
        let mut path = self.expect(TokenType::Identifier)?.value;

        while self.current_token_is(TokenType::Dot) {
            self.advance(); // Skip '.'
            let segment = self.expect(TokenType::Identifier)?;
            path.push('.');
            path.push_str(&segment.value);
        }

        Ok(path)
    }

    /// Parse an array: '[' expression (',' expression)* ']'
    fn parse_array(&mut self) -> Result<Expression> {
        self.expect(TokenType::OpenBracket)?;

        let mut items = Vec::new();
        if !self.current_token_is(TokenType::CloseBracket) {
            loop {
                self.check_recursion_depth()?;
                items.push(self.parse_or_expression()?);
                self.decrement_recursion_depth();
                if self.current_token_is(TokenType::Comma) {
                    self.advance(); // Skip ','
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseBracket)?;

        Ok(Expression::Array { items })
    }
}

/// Map a token to its comparison operator, if it is one
fn comparison_operator(token_type: &TokenType) -> Option<ComparisonOperator> {
    match token_type {
        TokenType::Equal => Some(ComparisonOperator::Eq),
        TokenType::NotEqual => Some(ComparisonOperator::Ne),
        TokenType::GreaterThan => Some(ComparisonOperator::Gt),
        TokenType::GreaterThanOrEqual => Some(ComparisonOperator::Ge),
        TokenType::LessThan => Some(ComparisonOperator::Lt),
        TokenType::LessThanOrEqual => Some(ComparisonOperator::Le),
        TokenType::In => Some(ComparisonOperator::In),
        TokenType::NotIn => Some(ComparisonOperator::NotIn),
        TokenType::Like => Some(ComparisonOperator::Like),
        TokenType::NotLike => Some(ComparisonOperator::NotLike),
        TokenType::ILike => Some(ComparisonOperator::ILike),
        TokenType::NotILike => Some(ComparisonOperator::NotILike),
        _ => None,
    }
}

/// Map a token to its arithmetic operator, if it is one
fn arithmetic_operator(token_type: &TokenType) -> Option<ArithmeticOperator> {
    match token_type {
        TokenType::Plus => Some(ArithmeticOperator::Add),
        TokenType::Minus => Some(ArithmeticOperator::Sub),
        TokenType::Multiply => Some(ArithmeticOperator::Mul),
        TokenType::Divide => Some(ArithmeticOperator::Div),
        _ => None,
    }
}

/// Type a string literal, converting ISO date/time bodies to temporal literals
fn string_literal(value: String) -> Literal {
    if let Some(date) = parse_date_literal(&value) {
        return Literal::Date(date);
    }
    if let Some(time) = parse_time_literal(&value) {
        return Literal::Time(time);
    }
    Literal::String(value)
}
