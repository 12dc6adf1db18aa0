//! Parser module for nginx configuration
//!
//! This module provides the lexer, the recursive descent parser and the
//! syntax error type.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::SyntaxError;
pub use lexer::{token_at, LexError, Location, Spanned, Token};
pub use parser::{parse, Parser};
