//! uriql error codes following a structured numbering system
//!
//! Error code ranges:
//! - UQL0001-UQL0099: Lexical errors (tokenization)
//! - UQL0100-UQL0199: Syntax errors (clause grammar)
//! - UQL0200-UQL0299: Binding errors (metadata resolution)
//! - UQL0300-UQL0399: Limit violations (configured resource bounds)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a lexical error (0001-0099)
    pub const fn is_lexical_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a syntax error (0100-0199)
    pub const fn is_syntax_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a binding error (0200-0299)
    pub const fn is_binding_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a limit violation (0300-0399)
    pub const fn is_limit_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UQL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Lexical errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unrecognized character"));
    map.insert(2, ErrorInfo::new("Unexpected end of clause"));
    map.insert(3, ErrorInfo::new("Unterminated string literal"));
    map.insert(4, ErrorInfo::new("Invalid number format"));
    map.insert(5, ErrorInfo::new("Incomplete system token"));

    // Syntax errors (0100-0199)
    map.insert(100, ErrorInfo::new("Unexpected token"));
    map.insert(
        101,
        ErrorInfo::new("Recursion limit exceeded")
            .with_help("Reduce the nesting depth of the clause or raise the configured limit"),
    );
    map.insert(102, ErrorInfo::new("System token not allowed in select or expand path"));
    map.insert(103, ErrorInfo::new("Wildcard must be the last path segment"));
    map.insert(104, ErrorInfo::new("Expected identifier"));
    map.insert(105, ErrorInfo::new("Missing closing parenthesis"));
    map.insert(106, ErrorInfo::new("Unknown query option"));
    map.insert(107, ErrorInfo::new("Duplicate query option"));
    map.insert(108, ErrorInfo::new("Invalid query option value"));
    map.insert(109, ErrorInfo::new("Expected expression"));
    map.insert(110, ErrorInfo::new("Expected end of clause"));

    // Binding errors (0200-0299)
    map.insert(
        200,
        ErrorInfo::new("Property not declared on type")
            .with_help("Check the property name against the declaring entity type"),
    );
    map.insert(201, ErrorInfo::new("Property is not a navigation property"));
    map.insert(202, ErrorInfo::new("Expand tree is not normalized"));
    map.insert(203, ErrorInfo::new("Type cast to unrelated type"));
    map.insert(204, ErrorInfo::new("Unknown type"));
    map.insert(205, ErrorInfo::new("Operand type mismatch"));
    map.insert(206, ErrorInfo::new("Unknown function"));
    map.insert(207, ErrorInfo::new("Invalid expand term"));
    map.insert(
        208,
        ErrorInfo::new("Select path traverses a navigation property that is not expanded")
            .with_help("Add a matching $expand term for the navigation property"),
    );

    // Limit violations (0300-0399)
    map.insert(300, ErrorInfo::new("Expansion depth limit exceeded"));
    map.insert(301, ErrorInfo::new("Expansion count limit exceeded"));

    map
});

// Convenient error code constants

// Lexical errors
pub const UQL0001: ErrorCode = ErrorCode::new(1);
pub const UQL0002: ErrorCode = ErrorCode::new(2);
pub const UQL0003: ErrorCode = ErrorCode::new(3);
pub const UQL0004: ErrorCode = ErrorCode::new(4);
pub const UQL0005: ErrorCode = ErrorCode::new(5);

// Syntax errors
pub const UQL0100: ErrorCode = ErrorCode::new(100);
pub const UQL0101: ErrorCode = ErrorCode::new(101);
pub const UQL0102: ErrorCode = ErrorCode::new(102);
pub const UQL0103: ErrorCode = ErrorCode::new(103);
pub const UQL0104: ErrorCode = ErrorCode::new(104);
pub const UQL0105: ErrorCode = ErrorCode::new(105);
pub const UQL0106: ErrorCode = ErrorCode::new(106);
pub const UQL0107: ErrorCode = ErrorCode::new(107);
pub const UQL0108: ErrorCode = ErrorCode::new(108);
pub const UQL0109: ErrorCode = ErrorCode::new(109);
pub const UQL0110: ErrorCode = ErrorCode::new(110);

// Binding errors
pub const UQL0200: ErrorCode = ErrorCode::new(200);
pub const UQL0201: ErrorCode = ErrorCode::new(201);
pub const UQL0202: ErrorCode = ErrorCode::new(202);
pub const UQL0203: ErrorCode = ErrorCode::new(203);
pub const UQL0204: ErrorCode = ErrorCode::new(204);
pub const UQL0205: ErrorCode = ErrorCode::new(205);
pub const UQL0206: ErrorCode = ErrorCode::new(206);
pub const UQL0207: ErrorCode = ErrorCode::new(207);
pub const UQL0208: ErrorCode = ErrorCode::new(208);

// Limit violations
pub const UQL0300: ErrorCode = ErrorCode::new(300);
pub const UQL0301: ErrorCode = ErrorCode::new(301);
