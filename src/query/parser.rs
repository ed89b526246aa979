//! Recursive-descent parser.
//!
//! Supported grammar:
//!
//! ```text
//! Statement      := SELECT Projection FROM Reference [WHERE WhereClause]
//! Projection     := ASTERISK | Reference {COMMA Reference}
//! WhereClause    := WhereTerm [OR WhereClause]
//! WhereTerm      := WhereFactor [AND WhereTerm]
//! WhereFactor    := [NOT] WherePrimary
//! WherePrimary   := LPAREN WhereClause RPAREN | Condition
//! Condition      := Reference Comparator RValue
//! RValue         := Reference | Number | String
//! Comparator     := EQUALS | LT | LTE | GT | GTE | NE
//! ```
//!
//! Precedence falls out of the structure: OR is parsed outermost, so AND
//! binds tighter, NOT tighter still, and groups and conditions tightest.

use super::ast::{
    Comparator, Condition, ParsedQuery, Projection, RValue, Reference, WhereClause, WhereFactor,
    WherePrimary, WhereTerm,
};
use super::lexer::{unexpected, Token, TokenKind, TokenStream};
use crate::types::{QueryError, Result};
use std::str::FromStr;

/// Parse query text into a [`ParsedQuery`].
///
/// # Errors
///
/// - `QueryError::InvalidToken` if the text contains an unrecognised span
/// - `QueryError::UnexpectedToken` if the tokens do not match the grammar
///
/// # Example
///
/// ```rust
/// use dictql::query::parse;
///
/// let query = parse("SELECT {name} FROM {sales_team} WHERE {sales} > 400").unwrap();
/// assert_eq!(query.source_name(), "sales_team");
/// ```
pub fn parse(sql: &str) -> Result<ParsedQuery> {
    Parser::new(TokenStream::new(sql)?).parse()
}

impl FromStr for ParsedQuery {
    type Err = QueryError;

    fn from_str(sql: &str) -> Result<Self> {
        parse(sql)
    }
}

/// Single-use parser over a buffered token stream.
pub struct Parser {
    tokens: TokenStream,
}

impl Parser {
    pub fn new(tokens: TokenStream) -> Self {
        Self { tokens }
    }

    /// Parse a complete statement, requiring all tokens to be consumed.
    pub fn parse(mut self) -> Result<ParsedQuery> {
        self.tokens.consume(&[TokenKind::Select])?;
        let projection = self.parse_projection()?;

        self.tokens.consume(&[TokenKind::From])?;
        let source = self.parse_reference()?;

        let where_clause = if self.tokens.next_is(TokenKind::Where) {
            self.tokens.consume(&[TokenKind::Where])?;
            Some(self.parse_where_clause()?)
        } else {
            None
        };

        if let Some(token) = self.tokens.peek() {
            return Err(unexpected(&[], Some(token)));
        }

        Ok(ParsedQuery {
            projection,
            source,
            where_clause,
        })
    }

    fn parse_reference(&mut self) -> Result<Reference> {
        let token = self.tokens.consume(&[TokenKind::Reference])?;
        Ok(Reference::from_lexeme(token.lexeme))
    }

    fn parse_projection(&mut self) -> Result<Projection> {
        let first = self
            .tokens
            .consume(&[TokenKind::Asterisk, TokenKind::Reference])?;
        if first.kind == TokenKind::Asterisk {
            return Ok(Projection::All);
        }

        let mut fields = vec![Reference::from_lexeme(first.lexeme)];
        while self.tokens.next_is(TokenKind::Comma) {
            self.tokens.consume(&[TokenKind::Comma])?;
            fields.push(self.parse_reference()?);
        }
        Ok(Projection::Fields(fields))
    }

    fn parse_where_clause(&mut self) -> Result<WhereClause> {
        let term = self.parse_where_term()?;
        let rest = if self.tokens.next_is(TokenKind::Or) {
            self.tokens.consume(&[TokenKind::Or])?;
            Some(Box::new(self.parse_where_clause()?))
        } else {
            None
        };
        Ok(WhereClause { term, rest })
    }

    fn parse_where_term(&mut self) -> Result<WhereTerm> {
        let factor = self.parse_where_factor()?;
        let rest = if self.tokens.next_is(TokenKind::And) {
            self.tokens.consume(&[TokenKind::And])?;
            Some(Box::new(self.parse_where_term()?))
        } else {
            None
        };
        Ok(WhereTerm { factor, rest })
    }

    fn parse_where_factor(&mut self) -> Result<WhereFactor> {
        if self.tokens.next_is(TokenKind::Not) {
            self.tokens.consume(&[TokenKind::Not])?;
            Ok(WhereFactor::Not(self.parse_where_primary()?))
        } else {
            Ok(WhereFactor::Primary(self.parse_where_primary()?))
        }
    }

    fn parse_where_primary(&mut self) -> Result<WherePrimary> {
        let token = self
            .tokens
            .consume(&[TokenKind::LeftParen, TokenKind::Reference])?;
        if token.kind == TokenKind::LeftParen {
            let inner = self.parse_where_clause()?;
            self.tokens.consume(&[TokenKind::RightParen])?;
            return Ok(WherePrimary::Group(Box::new(inner)));
        }
        Ok(WherePrimary::Condition(self.parse_condition(token)?))
    }

    fn parse_condition(&mut self, left: Token) -> Result<Condition> {
        let operator = self.tokens.consume(&TokenKind::COMPARATORS)?;
        let comparator = comparator_for(operator.kind)
            .ok_or_else(|| unexpected(&TokenKind::COMPARATORS, Some(&operator)))?;
        let right = self.parse_rvalue()?;

        Ok(Condition {
            left: Reference::from_lexeme(left.lexeme),
            comparator,
            right,
        })
    }

    fn parse_rvalue(&mut self) -> Result<RValue> {
        let token = self.tokens.consume(&TokenKind::RVALUES)?;
        match token.kind {
            TokenKind::Reference => Ok(RValue::Reference(Reference::from_lexeme(token.lexeme))),
            TokenKind::Number => {
                let lexeme = token.lexeme;
                RValue::number(lexeme.as_str()).ok_or(QueryError::InvalidToken(lexeme))
            }
            _ => Ok(RValue::string(token.lexeme)),
        }
    }
}

fn comparator_for(kind: TokenKind) -> Option<Comparator> {
    match kind {
        TokenKind::Equals => Some(Comparator::Eq),
        TokenKind::LessThan => Some(Comparator::Lt),
        TokenKind::LessOrEqual => Some(Comparator::Lte),
        TokenKind::GreaterThan => Some(Comparator::Gt),
        TokenKind::GreaterOrEqual => Some(Comparator::Gte),
        TokenKind::NotEqual => Some(Comparator::Ne),
        _ => None,
    }
}
