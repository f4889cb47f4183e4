//! Syntax tree definitions for the uriql query language
//!
//! This crate defines the untyped trees produced by the lexer and the
//! syntactic parsers: lexical tokens, slash-separated path-segment chains,
//! `$select`/`$expand` term tokens, and the filter/orderby expression AST.
//! Everything here is pre-metadata; the bound (semantic) tree lives in
//! `uriql-semantic`.

mod expression;
mod path;
mod select_expand;
mod token;

pub use expression::*;
pub use path::*;
pub use select_expand::*;
pub use token::*;
