//! uriql error types

use crate::{ErrorCode, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the clause cannot be processed
    Error,
    /// Warning - potential issue but processing can continue
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with clause location and context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Span into the offending clause text
    pub span: Option<Span>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    /// Set the span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

/// Main uriql error type
///
/// The four variants mirror the pipeline stages: tokenization, clause
/// grammar, metadata binding and post-bind limit enforcement. All are fatal;
/// no variant carries a partial tree.
#[derive(Debug, Clone, Error)]
pub enum UriqlError {
    /// Lexical error (unrecognized character, malformed literal)
    #[error("{code}: {message} at position {position} in {clause:?}")]
    Lexical {
        code: ErrorCode,
        message: String,
        /// The raw clause text being tokenized
        clause: String,
        /// Byte position of the offending character
        position: usize,
    },

    /// Syntax error (unexpected token, recursion limit, illegal segment)
    #[error("{code}: {message}")]
    Syntax {
        code: ErrorCode,
        message: String,
        /// The raw clause text being parsed
        clause: String,
        /// Byte position where the error was detected, if known
        position: Option<usize>,
    },

    /// Semantic binding error (unresolvable identifier, invalid cast)
    #[error("{code}: {message}")]
    Binding {
        code: ErrorCode,
        message: String,
        /// The identifier that failed to bind, if any
        identifier: Option<String>,
        /// The declaring type the identifier was resolved against, if any
        type_name: Option<String>,
    },

    /// Configured limit exceeded on the finished tree
    #[error("{code}: {message}")]
    Limit { code: ErrorCode, message: String },
}

impl UriqlError {
    /// Create a lexical error
    pub fn lexical(
        code: ErrorCode,
        message: impl Into<String>,
        clause: impl Into<String>,
        position: usize,
    ) -> Self {
        Self::Lexical {
            code,
            message: message.into(),
            clause: clause.into(),
            position,
        }
    }

    /// Create a syntax error with no position information
    pub fn syntax(code: ErrorCode, message: impl Into<String>, clause: impl Into<String>) -> Self {
        Self::Syntax {
            code,
            message: message.into(),
            clause: clause.into(),
            position: None,
        }
    }

    /// Create a syntax error at a clause position
    pub fn syntax_at(
        code: ErrorCode,
        message: impl Into<String>,
        clause: impl Into<String>,
        position: usize,
    ) -> Self {
        Self::Syntax {
            code,
            message: message.into(),
            clause: clause.into(),
            position: Some(position),
        }
    }

    /// Create a binding error
    pub fn binding(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Binding {
            code,
            message: message.into(),
            identifier: None,
            type_name: None,
        }
    }

    /// Create a binding error naming the identifier and its declaring type
    pub fn binding_for(
        code: ErrorCode,
        message: impl Into<String>,
        identifier: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::Binding {
            code,
            message: message.into(),
            identifier: Some(identifier.into()),
            type_name: Some(type_name.into()),
        }
    }

    /// Create a limit violation error
    pub fn limit(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Limit {
            code,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lexical { code, .. } => *code,
            Self::Syntax { code, .. } => *code,
            Self::Binding { code, .. } => *code,
            Self::Limit { code, .. } => *code,
        }
    }

    /// Get the offending clause text, when the error carries it
    pub fn clause(&self) -> Option<&str> {
        match self {
            Self::Lexical { clause, .. } | Self::Syntax { clause, .. } => Some(clause),
            _ => None,
        }
    }

    /// Get the byte position of the error, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lexical { position, .. } => Some(*position),
            Self::Syntax { position, .. } => *position,
            _ => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = match self {
            Self::Lexical { code, message, position, .. } => {
                Diagnostic::error(*code, message.clone()).with_span(Span::point(*position))
            }
            Self::Syntax { code, message, position, .. } => {
                let diag = Diagnostic::error(*code, message.clone());
                match position {
                    Some(pos) => diag.with_span(Span::point(*pos)),
                    None => diag,
                }
            }
            Self::Binding { code, message, .. } => Diagnostic::error(*code, message.clone()),
            Self::Limit { code, message } => Diagnostic::error(*code, message.clone()),
        };
        if let Some(help) = self.code().info().help {
            diag = diag.with_help(help);
        }
        diag
    }
}
