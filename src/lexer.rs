//! Filter lexer - tokenizes input strings
//!
//! Converts filter expression strings into a stream of tokens. Word operators
//! and keywords (`and`, `or`, `not`, `in`, `like`, `ilike`, `true`, `false`,
//! `null`) are case-insensitive.

use crate::token::{Token, TokenType};

/// The filter lexer
pub struct Lexer {
    position: usize,
    line: usize,
    column: usize,
    chars: Vec<char>,
    current_char: Option<char>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            position: 0,
            line: 1,
            column: 1,
            chars,
            current_char,
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
        if self.position < self.chars.len() {
            self.current_char = Some(self.chars[self.position]);
        } else {
            self.current_char = None;
        }
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        if self.position + 1 < self.chars.len() {
            Some(self.chars[self.position + 1])
        } else {
            None
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier: [A-Za-z_][A-Za-z0-9_]*
    fn read_identifier(&mut self) -> String {
        let start_pos = self.position;

        while let Some(c) = self.current_char {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        self.chars[start_pos..self.position].iter().collect()
    }

    /// Read a string literal delimited by the given quote character
    fn read_string(&mut self, quote: char) -> Result<String, String> {
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(c) = self.current_char {
            if c == quote {
                self.advance(); // Skip closing quote
                return Ok(value);
            } else if c == '\\' {
                // Handle escape sequences
                self.advance(); // Skip backslash
                let Some(escaped) = self.current_char else {
                    return Err("Incomplete escape sequence in string literal".into());
                };

                match escaped {
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    '/' => value.push('/'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'u' => {
                        // Unicode escape: \uXXXX
                        self.advance(); // Skip 'u'
                        let mut hex = String::new();
                        for _ in 0..4 {
                            match self.current_char {
                                Some(h) if h.is_ascii_hexdigit() => {
                                    hex.push(h);
                                    self.advance();
                                }
                                Some(_) => {
                                    return Err("Invalid unicode escape sequence".into());
                                }
                                None => {
                                    return Err("Incomplete unicode escape sequence".into());
                                }
                            }
                        }
                        let code = u32::from_str_radix(&hex, 16)
                            .map_err(|_| "Invalid unicode code point".to_string())?;
                        value.push(
                            char::from_u32(code)
                                .ok_or_else(|| "Invalid unicode character".to_string())?,
                        );
                        continue; // Don't advance again after unicode sequence
                    }
                    other => value.push(other),
                }

                self.advance();
            } else {
                value.push(c);
                self.advance();
            }
        }

        Err("Unterminated string literal".into())
    }

    /// Read a number literal (integer or decimal)
    fn read_number(&mut self) -> String {
        let start_pos = self.position;

        // Read integer part
        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // Read decimal part if present (only if followed by digits)
        if self.current_char == Some('.') {
            if let Some(next_char) = self.peek() {
                if next_char.is_ascii_digit() {
                    self.advance(); // Skip '.'
                    while let Some(c) = self.current_char {
                        if c.is_ascii_digit() {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
            }
            // If no digits after dot, don't consume it - leave it for next token
        }

        self.chars[start_pos..self.position].iter().collect()
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let position = self.position;
        let line = self.line;
        let column = self.column;

        let Some(c) = self.current_char else {
            return Token::eof(position, line, column);
        };

        match c {
            '.' => {
                self.advance();
                Token::new(TokenType::Dot, ".".into(), position, line, column)
            }
            ',' => {
                self.advance();
                Token::new(TokenType::Comma, ",".into(), position, line, column)
            }
            '(' => {
                self.advance();
                Token::new(TokenType::OpenParen, "(".into(), position, line, column)
            }
            ')' => {
                self.advance();
                Token::new(TokenType::CloseParen, ")".into(), position, line, column)
            }
            '[' => {
                self.advance();
                Token::new(TokenType::OpenBracket, "[".into(), position, line, column)
            }
            ']' => {
                self.advance();
                Token::new(TokenType::CloseBracket, "]".into(), position, line, column)
            }
            '+' => {
                self.advance();
                Token::new(TokenType::Plus, "+".into(), position, line, column)
            }
            '-' => {
                self.advance();
                Token::new(TokenType::Minus, "-".into(), position, line, column)
            }
            '*' => {
                self.advance();
                Token::new(TokenType::Multiply, "*".into(), position, line, column)
            }
            '/' => {
                self.advance();
                Token::new(TokenType::Divide, "/".into(), position, line, column)
            }
            '=' => {
                self.advance();
                Token::new(TokenType::Equal, "=".into(), position, line, column)
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(
                        TokenType::LessThanOrEqual,
                        "<=".into(),
                        position,
                        line,
                        column,
                    )
                } else {
                    Token::new(TokenType::LessThan, "<".into(), position, line, column)
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(
                        TokenType::GreaterThanOrEqual,
                        ">=".into(),
                        position,
                        line,
                        column,
                    )
                } else {
                    Token::new(TokenType::GreaterThan, ">".into(), position, line, column)
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::new(TokenType::NotEqual, "!=".into(), position, line, column)
                } else if self
                    .current_char
                    .map(|c| c.is_ascii_alphabetic())
                    .unwrap_or(false)
                {
                    // Negated word operator: !in, !like, !ilike
                    let ident = self.read_identifier();
                    match ident.to_ascii_lowercase().as_str() {
                        "in" => Token::new(TokenType::NotIn, "!in".into(), position, line, column),
                        "like" => {
                            Token::new(TokenType::NotLike, "!like".into(), position, line, column)
                        }
                        "ilike" => Token::new(
                            TokenType::NotILike,
                            "!ilike".into(),
                            position,
                            line,
                            column,
                        ),
                        _ => Token::error(
                            format!("Unexpected token: !{}", ident),
                            position,
                            line,
                            column,
                        ),
                    }
                } else {
                    Token::new(TokenType::Bang, "!".into(), position, line, column)
                }
            }
            '\'' | '"' => match self.read_string(c) {
                Ok(value) => Token::new(TokenType::StringLiteral, value, position, line, column),
                Err(e) => Token::error(format!("String error: {}", e), position, line, column),
            },
            _ => {
                if c.is_ascii_digit() {
                    let value = self.read_number();
                    Token::new(TokenType::NumberLiteral, value, position, line, column)
                } else if c.is_ascii_alphabetic() || c == '_' {
                    let ident = self.read_identifier();
                    // Check for keywords (case-insensitive)
                    let token_type = match ident.to_ascii_lowercase().as_str() {
                        "true" => TokenType::True,
                        "false" => TokenType::False,
                        "null" => TokenType::Null,
                        "and" => TokenType::And,
                        "or" => TokenType::Or,
                        "not" => TokenType::Not,
                        "in" => TokenType::In,
                        "like" => TokenType::Like,
                        "ilike" => TokenType::ILike,
                        _ => TokenType::Identifier,
                    };
                    Token::new(token_type, ident, position, line, column)
                } else {
                    self.advance();
                    Token::error(
                        format!("Unexpected character: {}", c),
                        position,
                        line,
                        column,
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = matches!(token.token_type, TokenType::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    #[test]
    fn test_identifiers() {
        let tokens = tokenize("countryCode name _test");
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[0].value, "countryCode");
        assert_eq!(tokens[1].token_type, TokenType::Identifier);
        assert_eq!(tokens[1].value, "name");
        assert_eq!(tokens[2].token_type, TokenType::Identifier);
        assert_eq!(tokens[2].value, "_test");
    }

    #[test]
    fn test_string_literals() {
        let tokens = tokenize("'hello' \"world\"");
        assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[0].value, "hello");
        assert_eq!(tokens[1].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[1].value, "world");
    }

    #[test]
    fn test_string_escape() {
        let tokens = tokenize("\"hello\\\"world\"");
        assert_eq!(tokens[0].token_type, TokenType::StringLiteral);
        assert_eq!(tokens[0].value, "hello\"world");
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("123 45.67");
        assert_eq!(tokens[0].token_type, TokenType::NumberLiteral);
        assert_eq!(tokens[0].value, "123");
        assert_eq!(tokens[1].token_type, TokenType::NumberLiteral);
        assert_eq!(tokens[1].value, "45.67");
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = tokenize("AND Or nOt IN Like ILIKE true FALSE null");
        assert_eq!(tokens[0].token_type, TokenType::And);
        assert_eq!(tokens[1].token_type, TokenType::Or);
        assert_eq!(tokens[2].token_type, TokenType::Not);
        assert_eq!(tokens[3].token_type, TokenType::In);
        assert_eq!(tokens[4].token_type, TokenType::Like);
        assert_eq!(tokens[5].token_type, TokenType::ILike);
        assert_eq!(tokens[6].token_type, TokenType::True);
        assert_eq!(tokens[7].token_type, TokenType::False);
        assert_eq!(tokens[8].token_type, TokenType::Null);
    }

    #[test]
    fn test_operators() {
        let tokens = tokenize("= != < <= > >= + - * /");
        assert_eq!(tokens[0].token_type, TokenType::Equal);
        assert_eq!(tokens[1].token_type, TokenType::NotEqual);
        assert_eq!(tokens[2].token_type, TokenType::LessThan);
        assert_eq!(tokens[3].token_type, TokenType::LessThanOrEqual);
        assert_eq!(tokens[4].token_type, TokenType::GreaterThan);
        assert_eq!(tokens[5].token_type, TokenType::GreaterThanOrEqual);
        assert_eq!(tokens[6].token_type, TokenType::Plus);
        assert_eq!(tokens[7].token_type, TokenType::Minus);
        assert_eq!(tokens[8].token_type, TokenType::Multiply);
        assert_eq!(tokens[9].token_type, TokenType::Divide);
    }

    #[test]
    fn test_negated_word_operators() {
        let tokens = tokenize("!in !like !ilike !");
        assert_eq!(tokens[0].token_type, TokenType::NotIn);
        assert_eq!(tokens[1].token_type, TokenType::NotLike);
        assert_eq!(tokens[2].token_type, TokenType::NotILike);
        assert_eq!(tokens[3].token_type, TokenType::Bang);
    }

    #[test]
    fn test_path_navigation() {
        let tokens = tokenize("address.city");
        assert_eq!(tokens[0].token_type, TokenType::Identifier);
        assert_eq!(tokens[1].token_type, TokenType::Dot);
        assert_eq!(tokens[2].token_type, TokenType::Identifier);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("a =");
        assert_eq!(tokens[1].line, 1);
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn test_unexpected_character() {
        let tokens = tokenize("a # b");
        assert_eq!(tokens[1].token_type, TokenType::Error);
    }
}
