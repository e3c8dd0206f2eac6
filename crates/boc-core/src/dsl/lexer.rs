//! Lexer for the BOC language
//!
//! Converts raw text input into a stream of tokens for parsing.

use crate::error::{BocError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token types recognized by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    // Literals
    Identifier(String),
    Number(f64),
    String(String),
    Boolean(bool),
    Uncertainty(f64), // the magnitude after '±'

    Keyword(Keyword),

    // Operators
    Assign,
    FatArrow,
    Dot,
    Range,

    // Delimiters
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Comma,
    Colon,
    Semicolon,

    Eof,
}

impl TokenType {
    /// Kind name used in parse error messages; ignores any payload.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TokenType::Identifier(_) => "IDENTIFIER",
            TokenType::Number(_) => "NUMBER",
            TokenType::String(_) => "STRING",
            TokenType::Boolean(_) => "BOOLEAN",
            TokenType::Uncertainty(_) => "UNCERTAINTY",
            TokenType::Keyword(keyword) => keyword.kind_name(),
            TokenType::Assign => "ASSIGN",
            TokenType::FatArrow => "LAMBDA",
            TokenType::Dot => "ACCESS",
            TokenType::Range => "RANGE",
            TokenType::LeftBrace => "LBRACE",
            TokenType::RightBrace => "RBRACE",
            TokenType::LeftBracket => "LBRACKET",
            TokenType::RightBracket => "RBRACKET",
            TokenType::LeftParen => "LPAREN",
            TokenType::RightParen => "RPAREN",
            TokenType::Comma => "COMMA",
            TokenType::Colon => "COLON",
            TokenType::Semicolon => "SEMICOLON",
            TokenType::Eof => "EOF",
        }
    }

    /// Same variant, payload ignored.
    pub fn same_kind(&self, other: &TokenType) -> bool {
        match (self, other) {
            (TokenType::Keyword(a), TokenType::Keyword(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Keywords in the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Belief,
    ReasoningContext,
    Intent,
    SharedState,
    SelfCapability,
    CalculateWithUncertainty,
    StructuredKnowledge,
    Entity,
    UpdateBelief,
    ConfidenceDecay,
    AgentCoordination,
    Provenance,
}

impl Keyword {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Keyword::Belief => "BELIEF",
            Keyword::ReasoningContext => "REASONING_CONTEXT",
            Keyword::Intent => "INTENT",
            Keyword::SharedState => "SHARED_STATE",
            Keyword::SelfCapability => "SELF_CAPABILITY",
            Keyword::CalculateWithUncertainty => "CALCULATE_WITH_UNCERTAINTY",
            Keyword::StructuredKnowledge => "STRUCTURED_KNOWLEDGE",
            Keyword::Entity => "ENTITY",
            Keyword::UpdateBelief => "UPDATE_BELIEF",
            Keyword::ConfidenceDecay => "CONFIDENCE_DECAY",
            Keyword::AgentCoordination => "AGENT_COORDINATION",
            Keyword::Provenance => "PROVENANCE",
        }
    }
}

/// Token with location information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text the token was read from (string tokens hold the unescaped body).
    pub text: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::Eof)
    }
}

const UNCERTAINTY_SIGN: char = '±';

/// Lexer for the BOC language
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    keywords: HashMap<&'static str, Keyword>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let mut keywords = HashMap::new();

        keywords.insert("belief", Keyword::Belief);
        keywords.insert("reasoning_context", Keyword::ReasoningContext);
        keywords.insert("intent", Keyword::Intent);
        keywords.insert("shared_state", Keyword::SharedState);
        keywords.insert("self_capability", Keyword::SelfCapability);
        keywords.insert("calculate_with_uncertainty", Keyword::CalculateWithUncertainty);
        keywords.insert("structured_knowledge", Keyword::StructuredKnowledge);
        keywords.insert("entity", Keyword::Entity);
        keywords.insert("update_belief", Keyword::UpdateBelief);
        keywords.insert("confidence_decay", Keyword::ConfidenceDecay);
        keywords.insert("agent_coordination", Keyword::AgentCoordination);
        keywords.insert("provenance", Keyword::Provenance);

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    /// Tokenize the entire input, EOF token included
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token. Once the input is exhausted every call returns EOF.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let start_line = self.line;
        let start_column = self.column;
        let start_offset = self.position;

        let ch = match self.current_char_opt() {
            Some(ch) => ch,
            None => {
                return Ok(Token {
                    token_type: TokenType::Eof,
                    text: String::new(),
                    line: start_line,
                    column: start_column,
                    offset: start_offset,
                    length: 0,
                })
            }
        };

        let (token_type, text) = match ch {
            '"' | '\'' => {
                let string = self.read_string(ch)?;
                (TokenType::String(string.clone()), string)
            }

            c if c.is_ascii_digit() => {
                let digits = self.read_number_run();
                let value = digits.parse::<f64>().map_err(|_| {
                    self.error_at(format!("Invalid number '{}'", digits), start_line, start_column)
                })?;
                (TokenType::Number(value), digits)
            }

            c if c.is_alphabetic() || c == '_' || c == '@' => {
                let identifier = self.read_identifier();
                let lowered = identifier.to_lowercase();
                let token_type = match lowered.as_str() {
                    "true" => TokenType::Boolean(true),
                    "false" => TokenType::Boolean(false),
                    other => match self.keywords.get(other) {
                        Some(keyword) => TokenType::Keyword(*keyword),
                        None => TokenType::Identifier(identifier.clone()),
                    },
                };
                (token_type, identifier)
            }

            UNCERTAINTY_SIGN => {
                self.advance(); // ±
                self.skip_inline_whitespace();
                if !self.current_char_opt().is_some_and(|c| c.is_ascii_digit()) {
                    return Err(self.error_at(
                        "Expected digits after '±'".to_string(),
                        start_line,
                        start_column,
                    ));
                }
                let digits = self.read_number_run();
                let value = digits.parse::<f64>().map_err(|_| {
                    self.error_at(
                        format!("Invalid uncertainty '±{}'", digits),
                        start_line,
                        start_column,
                    )
                })?;
                (TokenType::Uncertainty(value), format!("±{}", digits))
            }

            // Two-character operators before their single-character prefixes
            '.' if self.peek_char() == Some('.') => {
                self.advance();
                self.advance();
                (TokenType::Range, "..".to_string())
            }
            '=' if self.peek_char() == Some('>') => {
                self.advance();
                self.advance();
                (TokenType::FatArrow, "=>".to_string())
            }

            _ => {
                let token_type = match ch {
                    '=' => TokenType::Assign,
                    '.' => TokenType::Dot,
                    '{' => TokenType::LeftBrace,
                    '}' => TokenType::RightBrace,
                    '[' => TokenType::LeftBracket,
                    ']' => TokenType::RightBracket,
                    '(' => TokenType::LeftParen,
                    ')' => TokenType::RightParen,
                    ',' => TokenType::Comma,
                    ':' => TokenType::Colon,
                    ';' => TokenType::Semicolon,
                    _ => {
                        return Err(self.error_at(
                            format!("Illegal character '{}'", ch),
                            start_line,
                            start_column,
                        ));
                    }
                };
                self.advance();
                (token_type, ch.to_string())
            }
        };

        Ok(Token {
            token_type,
            text,
            line: start_line,
            column: start_column,
            offset: start_offset,
            length: self.position - start_offset,
        })
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current_char_opt() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_char() == Some('/') {
                while let Some(c) = self.current_char_opt() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while let Some(ch) = self.current_char_opt() {
            if ch == ' ' || ch == '\t' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read a string literal; a backslash passes the next character through.
    fn read_string(&mut self, quote: char) -> Result<String> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char_opt() {
            if ch == quote {
                self.advance();
                return Ok(string);
            }
            if ch == '\\' {
                self.advance();
                match self.current_char_opt() {
                    Some(escaped) => {
                        string.push(escaped);
                        self.advance();
                    }
                    None => break,
                }
            } else {
                string.push(ch);
                self.advance();
            }
        }

        Err(self.error_at(
            "Unterminated string literal".to_string(),
            start_line,
            start_column,
        ))
    }

    /// Digit-and-dot run. A dot directly followed by another dot ends the run.
    fn read_number_run(&mut self) -> String {
        let mut number = String::new();

        while let Some(ch) = self.current_char_opt() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && self.peek_char() != Some('.') {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        number
    }

    fn read_identifier(&mut self) -> String {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char_opt() {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '@' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        identifier
    }

    fn error_at(&self, message: String, line: usize, column: usize) -> BocError {
        BocError::Lexing {
            message,
            line,
            column,
        }
    }

    fn current_char_opt(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char_opt() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}
