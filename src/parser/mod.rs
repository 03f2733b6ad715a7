//! Infix expression parsing.
//!
//! Two stages: the tokenizer turns the input string into a flat token
//! sequence, and the AST builder runs the shunting-yard algorithm over it to
//! produce a binary tree whose internal nodes are operators and whose leaves
//! are numeric literals. Both stages reject malformed input with
//! [`ParseError`]; the HTTP layer surfaces every variant as an invalid
//! expression.

pub mod ast;
pub mod tokenizer;


pub use ast::{build_ast, AstNode};
pub use tokenizer::{tokenize, Token};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character: {0}")]
    UnexpectedChar(char),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("mismatched parentheses")]
    UnbalancedParens,

    #[error("invalid expression")]
    Malformed,
}

/// Tokenizes and builds the AST in one call.
pub fn parse(input: &str) -> Result<AstNode, ParseError> {
    let tokens = tokenize(input)?;
    build_ast(tokens)
}
