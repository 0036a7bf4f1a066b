//! Command parser
//!
//! Recursive descent over the token stream, producing one [`Statement`]
//! per command. The grammar is deliberately narrow: six leading keywords,
//! positional INSERT values, equality-only predicates on `id`, and a
//! single-level JOIN on one equality condition.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// Command parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a parser from a command string
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single statement
    pub fn parse(&mut self) -> Result<Statement> {
        let statement = match self.current() {
            Token::Create => self.parse_create_table(),
            Token::Drop => self.parse_drop_table(),
            Token::Insert => self.parse_insert(),
            Token::Select => self.parse_select(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            Token::Eof => Err(Error::UnexpectedEof("a command".to_string())),
            other => Err(Error::UnsupportedOperation(other.to_string())),
        }?;

        // Optional trailing semicolon, then nothing else.
        if self.check(&Token::Semicolon) {
            self.advance();
        }
        self.expect(Token::Eof)?;

        Ok(statement)
    }

    // ========== Statements ==========

    /// CREATE TABLE name (col type [UNIQUE], ...)
    fn parse_create_table(&mut self) -> Result<Statement> {
        self.expect(Token::Create)?;
        self.expect(Token::Table)?;
        let table_name = self.expect_identifier()?;

        self.expect(Token::LParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_spec()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen)?;

        Ok(Statement::CreateTable(CreateTableStatement {
            table_name,
            columns,
        }))
    }

    fn parse_column_spec(&mut self) -> Result<ColumnSpec> {
        let name = self.expect_identifier()?;

        let data_type = match self.current() {
            Token::Int => DataType::Integer,
            Token::String => DataType::Text,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "a column type (int or string)".to_string(),
                    found: other.to_string(),
                })
            }
        };
        self.advance();

        let unique = if self.check(&Token::Unique) {
            self.advance();
            true
        } else {
            false
        };

        Ok(ColumnSpec {
            name,
            data_type,
            unique,
        })
    }

    /// DROP TABLE name
    fn parse_drop_table(&mut self) -> Result<Statement> {
        self.expect(Token::Drop)?;
        self.expect(Token::Table)?;
        let table_name = self.expect_identifier()?;
        Ok(Statement::DropTable(DropTableStatement { table_name }))
    }

    /// INSERT INTO name VALUES (lit, ...)
    fn parse_insert(&mut self) -> Result<Statement> {
        self.expect(Token::Insert)?;
        self.expect(Token::Into)?;
        let table_name = self.expect_identifier()?;
        self.expect(Token::Values)?;

        self.expect(Token::LParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::RParen)?;

        Ok(Statement::Insert(InsertStatement { table_name, values }))
    }

    /// SELECT * FROM name [WHERE id = lit | JOIN other ON a.b = c.d]
    fn parse_select(&mut self) -> Result<Statement> {
        self.expect(Token::Select)?;
        self.expect(Token::Asterisk)?;
        self.expect(Token::From)?;
        let table_name = self.expect_identifier()?;

        let mut filter = None;
        let mut join = None;

        if self.check(&Token::Where) {
            filter = Some(self.parse_id_predicate()?);
        } else if self.check(&Token::Join) {
            self.advance();
            let join_table = self.expect_identifier()?;
            self.expect(Token::On)?;
            let left = self.parse_column_ref()?;
            self.expect(Token::Eq)?;
            let right = self.parse_column_ref()?;
            join = Some(JoinClause {
                table_name: join_table,
                left,
                right,
            });
        }

        Ok(Statement::Select(SelectStatement {
            table_name,
            filter,
            join,
        }))
    }

    /// UPDATE name SET col = lit, ... WHERE id = lit
    fn parse_update(&mut self) -> Result<Statement> {
        self.expect(Token::Update)?;
        let table_name = self.expect_identifier()?;
        self.expect(Token::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier()?;
            self.expect(Token::Eq)?;
            let value = self.parse_literal()?;
            assignments.push(Assignment { column, value });
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let id = self.parse_id_predicate()?;

        Ok(Statement::Update(UpdateStatement {
            table_name,
            assignments,
            id,
        }))
    }

    /// DELETE FROM name WHERE id = lit
    fn parse_delete(&mut self) -> Result<Statement> {
        self.expect(Token::Delete)?;
        self.expect(Token::From)?;
        let table_name = self.expect_identifier()?;
        let id = self.parse_id_predicate()?;
        Ok(Statement::Delete(DeleteStatement { table_name, id }))
    }

    // ========== Clauses ==========

    /// WHERE id = <literal>. The only supported predicate shape.
    fn parse_id_predicate(&mut self) -> Result<Literal> {
        self.expect(Token::Where)?;
        let column = self.expect_identifier()?;
        if !column.eq_ignore_ascii_case("id") {
            return Err(Error::SyntaxError(
                "only 'WHERE id = <integer>' predicates are supported".to_string(),
            ));
        }
        self.expect(Token::Eq)?;
        self.parse_literal()
    }

    /// table.column
    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let table = self.expect_identifier()?;
        self.expect(Token::Dot)?;
        let column = self.expect_identifier()?;
        Ok(ColumnRef { table, column })
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current() {
            Token::IntegerLiteral(n) => Literal::Integer(*n),
            Token::StringLiteral(s) => Literal::Text(s.clone()),
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "a literal value".to_string(),
                    found: other.to_string(),
                })
            }
        };
        self.advance();
        Ok(literal)
    }

    // ========== Cursor helpers ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.check(&token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: token.to_string(),
                found: self.current().to_string(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(Error::UnexpectedToken {
                expected: "an identifier".to_string(),
                found: other.to_string(),
            }),
        }
    }
}

/// Parse a single command string into a statement
pub fn parse(input: &str) -> Result<Statement> {
    Parser::new(input)?.parse()
}
