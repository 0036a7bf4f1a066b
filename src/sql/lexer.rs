//! Command lexer (tokenizer)
//!
//! This module converts command strings into a stream of tokens.

use super::token::Token;
use crate::error::{Error, Result};

/// Command lexer
pub struct Lexer {
    /// Input characters
    input: Vec<char>,
    /// Current position in input
    position: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token from the input
    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        if self.is_at_end() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        match ch {
            '(' => {
                self.advance();
                return Ok(Token::LParen);
            }
            ')' => {
                self.advance();
                return Ok(Token::RParen);
            }
            ',' => {
                self.advance();
                return Ok(Token::Comma);
            }
            ';' => {
                self.advance();
                return Ok(Token::Semicolon);
            }
            '.' => {
                self.advance();
                return Ok(Token::Dot);
            }
            '=' => {
                self.advance();
                return Ok(Token::Eq);
            }
            '*' => {
                self.advance();
                return Ok(Token::Asterisk);
            }
            '-' => {
                self.advance();
                if !self.is_at_end() && self.current_char().is_ascii_digit() {
                    return match self.read_number()? {
                        Token::IntegerLiteral(n) => Ok(Token::IntegerLiteral(-n)),
                        other => Ok(other),
                    };
                }
                return Err(Error::UnexpectedCharacter('-', self.position));
            }
            '\'' | '"' => {
                return self.read_string(ch);
            }
            _ => {}
        }

        if ch.is_ascii_digit() {
            return self.read_number();
        }

        if ch.is_alphabetic() || ch == '_' {
            return self.read_identifier();
        }

        Err(Error::UnexpectedCharacter(ch, self.position))
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Read a string literal delimited by `quote`; a doubled quote is an
    /// escaped quote character.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        let start_pos = self.position;
        self.advance(); // skip opening quote

        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();

            if ch == quote {
                if self.peek_char() == Some(quote) {
                    value.push(quote);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    return Ok(Token::StringLiteral(value));
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start_pos))
    }

    /// Read an integer literal
    fn read_number(&mut self) -> Result<Token> {
        let start_pos = self.position;
        let mut value = String::new();

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }

        value
            .parse::<i64>()
            .map(Token::IntegerLiteral)
            .map_err(|_| Error::InvalidNumber(start_pos))
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Result<Token> {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(keyword) = Token::from_keyword(&value) {
            Ok(keyword)
        } else {
            Ok(Token::Identifier(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let mut lexer = Lexer::new("SELECT * FROM users");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_select_with_where() {
        let mut lexer = Lexer::new("select * from users where id = 1");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Select,
                Token::Asterisk,
                Token::From,
                Token::Identifier("users".to_string()),
                Token::Where,
                Token::Identifier("id".to_string()),
                Token::Eq,
                Token::IntegerLiteral(1),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_create_table() {
        let mut lexer = Lexer::new("CREATE TABLE accounts (id int, name string UNIQUE)");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Create,
                Token::Table,
                Token::Identifier("accounts".to_string()),
                Token::LParen,
                Token::Identifier("id".to_string()),
                Token::Int,
                Token::Comma,
                Token::Identifier("name".to_string()),
                Token::String,
                Token::Unique,
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literals_both_quotes() {
        let mut lexer = Lexer::new(r#"VALUES (1, "Alice", 'Bob')"#);
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[2], Token::IntegerLiteral(1));
        assert_eq!(tokens[4], Token::StringLiteral("Alice".to_string()));
        assert_eq!(tokens[6], Token::StringLiteral("Bob".to_string()));
    }

    #[test]
    fn test_escaped_quote() {
        let mut lexer = Lexer::new("'it''s a test'");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[0], Token::StringLiteral("it's a test".to_string()));
    }

    #[test]
    fn test_negative_number() {
        let mut lexer = Lexer::new("VALUES (-5)");
        let tokens = lexer.tokenize().unwrap();
        assert_eq!(tokens[2], Token::IntegerLiteral(-5));
    }

    #[test]
    fn test_qualified_column() {
        let mut lexer = Lexer::new("users.id = orders.user_id");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(
            tokens,
            vec![
                Token::Identifier("users".to_string()),
                Token::Dot,
                Token::Identifier("id".to_string()),
                Token::Eq,
                Token::Identifier("orders".to_string()),
                Token::Dot,
                Token::Identifier("user_id".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'oops");
        let err = lexer.tokenize().unwrap_err();
        assert!(matches!(err, Error::UnterminatedString(_)));
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("SELECT @");
        let err = lexer.tokenize().unwrap_err();
        assert!(matches!(err, Error::UnexpectedCharacter('@', _)));
    }
}
