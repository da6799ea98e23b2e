//! Lexer for query string syntax
//!
//! Tokenizes Lucene-style query strings into a stream of tokens. Every token
//! records the char offset it started at so parse errors can point at it.

use crate::error::{Result, TalkdexError};

/// Token types for query string parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A term (unquoted word, may end in `*`)
    Term(String),
    /// A quoted string (phrase)
    QuotedString(String),

    /// AND operator (`AND` or `&&`)
    And,
    /// OR operator (`OR` or `||`)
    Or,
    /// NOT operator (`NOT` or `!`)
    Not,
    /// Colon separator (field:value)
    Colon,

    /// Tilde with optional slop
    Tilde(Option<u32>),
    /// Caret for boosting with optional boost value
    Caret(Option<f32>),

    /// Left parenthesis (grouping)
    LeftParen,
    /// Right parenthesis (grouping)
    RightParen,

    /// Plus sign (required clause)
    Plus,
    /// Minus sign (prohibited clause)
    Minus,

    /// End of input
    Eof,
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Char offset where the most recently returned token started
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.token_start = self.position;

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        match ch {
            ':' => {
                self.advance();
                Ok(Token::Colon)
            }
            '~' => {
                self.advance();
                let slop = self.read_unsigned_int();
                Ok(Token::Tilde(slop))
            }
            '^' => {
                self.advance();
                let boost = self.read_float();
                Ok(Token::Caret(boost))
            }
            '(' => {
                self.advance();
                Ok(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RightParen)
            }
            '+' => {
                self.advance();
                Ok(Token::Plus)
            }
            '-' => {
                self.advance();
                Ok(Token::Minus)
            }
            '!' => {
                self.advance();
                Ok(Token::Not)
            }
            '&' if self.peek() == Some('&') => {
                self.position += 2;
                Ok(Token::And)
            }
            '|' if self.peek() == Some('|') => {
                self.position += 2;
                Ok(Token::Or)
            }
            '"' => {
                self.advance();
                self.read_quoted_string()
            }
            _ if Self::is_term_start(ch) => self.read_term(),
            _ => Err(TalkdexError::query_parse(
                self.position,
                format!("Unexpected character '{}'", ch),
            )),
        }
    }

    fn read_term(&mut self) -> Result<Token> {
        let mut term = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '\\' {
                self.advance();
                if self.position >= self.input.len() {
                    return Err(TalkdexError::query_parse(
                        self.position,
                        "Escape character at end of input",
                    ));
                }
                term.push(self.current_char());
                self.advance();
            } else if Self::is_term_char(ch) {
                term.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Operators are upper case only; lower case `and` is an ordinary term
        match term.as_str() {
            "AND" => Ok(Token::And),
            "OR" => Ok(Token::Or),
            "NOT" => Ok(Token::Not),
            _ => Ok(Token::Term(term)),
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let mut s = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '"' {
                self.advance();
                return Ok(Token::QuotedString(s));
            }
            if ch == '\\' {
                self.advance();
                if self.position < self.input.len() {
                    s.push(self.current_char());
                    self.advance();
                }
            } else {
                s.push(ch);
                self.advance();
            }
        }

        Err(TalkdexError::query_parse(
            self.token_start,
            "Unterminated quoted string",
        ))
    }

    fn read_unsigned_int(&mut self) -> Option<u32> {
        let mut num_str = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        num_str.parse().ok()
    }

    fn read_float(&mut self) -> Option<f32> {
        let mut num_str = String::new();
        let mut has_dot = false;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        num_str.parse().ok()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Check if a character can start a term
    fn is_term_start(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '@' | '#' | '*' | '\\')
    }

    /// Check if a character can be part of a term
    fn is_term_char(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '@' | '#' | '*' | '/' | '\'')
    }
}
