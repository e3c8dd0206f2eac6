use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BocError {
    #[error("Lexing failed: {message} at line {line}, column {column}")]
    Lexing {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("Parsing failed: expected {expected}, found {found} at line {line}, column {column}")]
    Parsing {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("Invalid value: {0}")]
    Value(String),
    #[error("Formula evaluation failed: {0}")]
    Formula(String),
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

impl BocError {
    pub(crate) fn value(message: impl Into<String>) -> Self {
        BocError::Value(message.into())
    }

    /// True for errors raised by the tokenizer or the parser.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, BocError::Lexing { .. } | BocError::Parsing { .. })
    }
}

pub type Result<T> = std::result::Result<T, BocError>;
