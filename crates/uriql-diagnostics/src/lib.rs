//! Diagnostics and error handling for the uriql query pipeline
//!
//! This crate provides the error infrastructure shared by the lexer, the
//! syntactic parsers and the semantic binder: coded errors, byte spans into
//! the offending clause text, and diagnostic reporting.

mod error;
mod error_code;
mod span;

pub use error::*;
pub use error_code::*;
pub use span::*;

/// Result type for uriql operations
pub type Result<T> = std::result::Result<T, UriqlError>;
