/*!
# Rust Language Module

This Rust module provides lexical analysis and parsing of ST-light,
the Structured Text subset run by the logic engine.

*/

pub type LineNumber = Option<u16>;
pub type Column = std::ops::Range<usize>;

#[macro_use]
mod error;
mod lex;
mod parse;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use lex::lex;
pub use parse::parse;
pub use token::{Literal, Operator, Spanned, Token, Word};

pub mod ast;
