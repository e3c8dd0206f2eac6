//! BOC language front-end
//!
//! Tokenizer, recursive-descent parser and AST for belief, intent and
//! uncertainty statements, plus an interpreter that gives those statements
//! meaning against a belief store and the uncertainty engine.

pub mod ast;
pub mod decay_rules;
pub mod interpreter;
pub mod lexer;
pub mod parser;

#[cfg(test)]
mod tests;

pub use ast::*;
pub use interpreter::{Interpreter, StatementOutcome};
pub use lexer::{Keyword, Lexer, Token, TokenType};
pub use parser::Parser;

use crate::error::Result;

/// Parse a complete program from source text
pub fn parse(source: &str) -> Result<Program> {
    let mut parser = Parser::new(Lexer::new(source))?;
    parser.parse_program()
}
