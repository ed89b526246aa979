//! Query tokenizer.
//!
//! Turns query text into an ordered sequence of [`Token`]s. Tokenizing is
//! eager: [`TokenStream`] buffers every token up front so the parser can look
//! ahead without re-scanning.
//!
//! Scanning is separator-driven:
//! - `{` collects a reference up to and including the next `}`
//! - `'` or `"` collects a string up to and including the matching quote
//! - `=<>(),*` collect an operator (`<=`, `>=`, `<>` are taken greedily)
//! - anything else collects a bare run of ASCII letters, digits, `_` and `.`
//!
//! Each span is then classified; a span matching no token kind is an
//! [`QueryError::InvalidToken`].

use crate::types::{QueryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("number pattern is valid"));

/// Characters that start an operator span and terminate a bare run.
const OPERATOR_CHARS: &str = "=<>(),*";

/// Two-character operators, matched before single characters.
const COMPOUND_OPERATORS: [&str; 3] = ["<=", ">=", "<>"];

/// Reserved words, matched case-insensitively.
const KEYWORDS: [(&str, TokenKind); 6] = [
    ("SELECT", TokenKind::Select),
    ("FROM", TokenKind::From),
    ("WHERE", TokenKind::Where),
    ("AND", TokenKind::And),
    ("OR", TokenKind::Or),
    ("NOT", TokenKind::Not),
];

/// Symbol lexemes, matched exactly.
const SYMBOLS: [(&str, TokenKind); 10] = [
    ("=", TokenKind::Equals),
    ("<", TokenKind::LessThan),
    ("<=", TokenKind::LessOrEqual),
    (">", TokenKind::GreaterThan),
    (">=", TokenKind::GreaterOrEqual),
    ("<>", TokenKind::NotEqual),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    (",", TokenKind::Comma),
    ("*", TokenKind::Asterisk),
];

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// `{field}`
    Reference,
    /// `-12.5`
    Number,
    /// `'text'` or `"text"`
    String,
    Equals,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    NotEqual,
    LeftParen,
    RightParen,
    Comma,
    Asterisk,
    Select,
    From,
    Where,
    And,
    Or,
    Not,
}

impl TokenKind {
    /// Comparison operators allowed in a condition.
    pub const COMPARATORS: [TokenKind; 6] = [
        TokenKind::Equals,
        TokenKind::LessThan,
        TokenKind::LessOrEqual,
        TokenKind::GreaterThan,
        TokenKind::GreaterOrEqual,
        TokenKind::NotEqual,
    ];

    /// Token kinds allowed on the right-hand side of a condition.
    pub const RVALUES: [TokenKind; 3] = [TokenKind::Reference, TokenKind::Number, TokenKind::String];

    /// Classify a scanned span.
    ///
    /// Keywords win over everything else, then symbols, references, strings
    /// and numbers, in that order.
    ///
    /// # Returns
    ///
    /// The token kind, or `None` if the span is not a valid token
    pub fn classify(span: &str) -> Option<TokenKind> {
        if let Some((_, kind)) = KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(span))
        {
            return Some(*kind);
        }

        if let Some((_, kind)) = SYMBOLS.iter().find(|(symbol, _)| *symbol == span) {
            return Some(*kind);
        }

        if is_reference(span) {
            Some(TokenKind::Reference)
        } else if is_string(span) {
            Some(TokenKind::String)
        } else if NUMBER_PATTERN.is_match(span) {
            Some(TokenKind::Number)
        } else {
            None
        }
    }

    pub fn is_keyword(&self) -> bool {
        KEYWORDS.iter().any(|(_, kind)| kind == self)
    }

    /// Human-readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Number => "number",
            Self::String => "string",
            Self::Equals => "'='",
            Self::LessThan => "'<'",
            Self::LessOrEqual => "'<='",
            Self::GreaterThan => "'>'",
            Self::GreaterOrEqual => "'>='",
            Self::NotEqual => "'<>'",
            Self::LeftParen => "'('",
            Self::RightParen => "')'",
            Self::Comma => "','",
            Self::Asterisk => "'*'",
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

fn is_reference(span: &str) -> bool {
    span.len() >= 2
        && span.starts_with('{')
        && span.ends_with('}')
        && !span[1..span.len() - 1].contains('}')
}

fn is_string(span: &str) -> bool {
    let Some(quote) = span.chars().next().filter(|c| *c == '\'' || *c == '"') else {
        return false;
    };
    span.len() >= 2 && span.ends_with(quote) && !span[1..span.len() - 1].contains(quote)
}

/// A classified span of query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text, including braces and quotes
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

/// Scanner over query text, yielding one token per call.
///
/// # Example
///
/// ```rust
/// use dictql::query::lexer::{Lexer, TokenKind};
///
/// let kinds: Vec<TokenKind> = Lexer::new("SELECT * FROM {data}")
///     .map(|token| token.unwrap().kind)
///     .collect();
/// assert_eq!(
///     kinds,
///     vec![TokenKind::Select, TokenKind::Asterisk, TokenKind::From, TokenKind::Reference]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Scan the next raw span, skipping leading whitespace.
    fn scan_span(&mut self) -> Option<&'a str> {
        let rest = &self.source[self.pos..];
        let text = rest.trim_start();
        self.pos += rest.len() - text.len();

        let first = text.chars().next()?;
        let len = match first {
            '{' => delimited_len(text, '}'),
            '\'' | '"' => delimited_len(text, first),
            c if OPERATOR_CHARS.contains(c) => operator_len(text),
            _ => bare_len(text, first),
        };

        self.pos += len;
        Some(&text[..len])
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.scan_span()?;
        Some(match TokenKind::classify(span) {
            Some(kind) => Ok(Token::new(kind, span)),
            None => Err(QueryError::InvalidToken(span.to_string())),
        })
    }
}

/// Length of a span opened by a one-byte delimiter and closed by `close`.
/// An unterminated span runs to the end of the text.
fn delimited_len(text: &str, close: char) -> usize {
    match text[1..].find(close) {
        Some(offset) => 1 + offset + close.len_utf8(),
        None => text.len(),
    }
}

fn operator_len(text: &str) -> usize {
    if COMPOUND_OPERATORS.iter().any(|op| text.starts_with(op)) {
        2
    } else {
        1
    }
}

fn bare_len(text: &str, first: char) -> usize {
    let start = first.len_utf8();
    let run = text[start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(text.len() - start);
    start + run
}

/// Tokenize the whole query up front.
///
/// # Errors
///
/// Returns `QueryError::InvalidToken` for the first span that is not a valid token
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).collect()
}

/// Buffered tokens with one-token lookahead.
///
/// Consuming a token moves it out of the stream, so lexemes flow into the
/// AST without copying.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: VecDeque<Token>,
}

impl TokenStream {
    /// Tokenize `source` and buffer the result.
    pub fn new(source: &str) -> Result<Self> {
        Ok(Self::from_tokens(tokenize(source)?))
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into(),
        }
    }

    /// Consume the next token, requiring its kind to be one of `expected`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnexpectedToken` if the next token has another
    /// kind or the stream is exhausted. The stream is left unchanged.
    pub fn consume(&mut self, expected: &[TokenKind]) -> Result<Token> {
        match self.tokens.pop_front() {
            Some(token) if expected.contains(&token.kind) => Ok(token),
            Some(token) => {
                let err = unexpected(expected, Some(&token));
                self.tokens.push_front(token);
                Err(err)
            }
            None => Err(unexpected(expected, None)),
        }
    }

    /// Consume the next token whatever its kind.
    pub fn advance(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.front()
    }

    pub fn next_is(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|token| token.kind == kind)
    }

    pub fn is_exhausted(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Build an `UnexpectedToken` error for a failed expectation.
pub(crate) fn unexpected(expected: &[TokenKind], found: Option<&Token>) -> QueryError {
    let expected = match expected {
        [] => "end of input".to_string(),
        kinds => kinds
            .iter()
            .map(TokenKind::describe)
            .collect::<Vec<_>>()
            .join(" or "),
    };
    let found = found
        .map(|token| token.lexeme.clone())
        .unwrap_or_else(|| "end of input".to_string());
    QueryError::UnexpectedToken { expected, found }
}
