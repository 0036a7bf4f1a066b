//! Command token definitions
//!
//! This module defines the tokens of the restricted command grammar.

use std::fmt;

/// Command tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    Create,
    Drop,
    Table,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Join,
    On,
    Update,
    Set,
    Delete,
    Unique,

    // Column type keywords
    Int,
    String,

    // ========== Literals ==========
    /// Integer literal
    IntegerLiteral(i64),
    /// String literal (single- or double-quoted)
    StringLiteral(String),
    /// Identifier (table or column name)
    Identifier(String),

    // ========== Operators & Delimiters ==========
    /// =
    Eq,
    /// *
    Asterisk,
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// .
    Dot,
    /// ;
    Semicolon,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Try to parse a keyword from a string (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<Token> {
        match s.to_uppercase().as_str() {
            "CREATE" => Some(Token::Create),
            "DROP" => Some(Token::Drop),
            "TABLE" => Some(Token::Table),
            "INSERT" => Some(Token::Insert),
            "INTO" => Some(Token::Into),
            "VALUES" => Some(Token::Values),
            "SELECT" => Some(Token::Select),
            "FROM" => Some(Token::From),
            "WHERE" => Some(Token::Where),
            "JOIN" => Some(Token::Join),
            "ON" => Some(Token::On),
            "UPDATE" => Some(Token::Update),
            "SET" => Some(Token::Set),
            "DELETE" => Some(Token::Delete),
            "UNIQUE" => Some(Token::Unique),
            "INT" => Some(Token::Int),
            "STRING" => Some(Token::String),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Create => write!(f, "CREATE"),
            Token::Drop => write!(f, "DROP"),
            Token::Table => write!(f, "TABLE"),
            Token::Insert => write!(f, "INSERT"),
            Token::Into => write!(f, "INTO"),
            Token::Values => write!(f, "VALUES"),
            Token::Select => write!(f, "SELECT"),
            Token::From => write!(f, "FROM"),
            Token::Where => write!(f, "WHERE"),
            Token::Join => write!(f, "JOIN"),
            Token::On => write!(f, "ON"),
            Token::Update => write!(f, "UPDATE"),
            Token::Set => write!(f, "SET"),
            Token::Delete => write!(f, "DELETE"),
            Token::Unique => write!(f, "UNIQUE"),
            Token::Int => write!(f, "int"),
            Token::String => write!(f, "string"),
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Eq => write!(f, "="),
            Token::Asterisk => write!(f, "*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Semicolon => write!(f, ";"),
            Token::Eof => write!(f, "end of command"),
        }
    }
}
