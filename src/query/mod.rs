//! Query language: lexing, parsing and evaluation.
//!
//! ```text
//! SELECT {name}, {city} FROM {sales_team} WHERE {sales} > 400 OR NOT ({city} = 'London')
//! ```
//!
//! `AND` binds tighter than `OR`; `NOT` applies to the primary that follows it.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{
    Comparator, Condition, Numeric, ParsedQuery, Projection, RValue, Reference, WhereClause,
    WhereFactor, WherePrimary, WhereTerm,
};
pub use eval::{compare, satisfied, Operand};
pub use lexer::{tokenize, Lexer, Token, TokenKind, TokenStream};
pub use parser::{parse, Parser};
