//! Command language module
//!
//! Lexer, parser, and AST for the six-keyword command grammar.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Literal, Statement};
pub use lexer::Lexer;
pub use parser::{parse, Parser};
pub use token::Token;
