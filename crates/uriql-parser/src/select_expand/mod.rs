//! `$select`/`$expand` syntactic parsers
//!
//! Two interchangeable term-parsing strategies share one [`TermParserCore`]:
//! [`OptionTermParser`](crate::OptionTermParser) for the current grammar
//! (parenthesized per-term options) and
//! [`NonOptionTermParser`](crate::NonOptionTermParser) for the legacy
//! grammar (bare paths only). The core owns the lexer and the explicit
//! recursion-depth counter both strategies are bounded by.

mod legacy;
mod options;

pub use legacy::NonOptionTermParser;
pub use options::OptionTermParser;

use uriql_ast::{
    ExpandToken, Literal, NamedParameter, PathSegment, SelectToken, Token, TokenKind,
};
use uriql_diagnostics::{
    Result, UriqlError, UQL0004, UQL0100, UQL0101, UQL0102, UQL0103, UQL0109,
};

use crate::lexer::ExpressionLexer;

/// Common contract of the two term-parsing strategies
pub trait TermParser {
    /// Parse a whole `$select` clause
    fn parse_select(&mut self) -> Result<SelectToken>;

    /// Parse a whole `$expand` clause
    fn parse_expand(&mut self) -> Result<ExpandToken>;
}

/// Shared state of both term-parsing strategies: the lexer plus the
/// explicit recursion-depth counter
#[derive(Debug)]
pub(crate) struct TermParserCore {
    pub(crate) lexer: ExpressionLexer,
    max_depth: usize,
    depth: usize,
}

impl TermParserCore {
    pub(crate) fn new(clause: &str, max_depth: usize, allow_semicolon: bool) -> Result<Self> {
        Ok(Self {
            lexer: ExpressionLexer::new(clause, true, allow_semicolon)?,
            max_depth,
            depth: 0,
        })
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Enter one level of recursive descent; fails once the configured
    /// limit is exceeded
    pub(crate) fn recurse_enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(UriqlError::syntax(
                UQL0101,
                format!("Recursion limit of {} exceeded", self.max_depth),
                self.lexer.text(),
            ));
        }
        Ok(())
    }

    pub(crate) fn recurse_leave(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Fail with an unexpected-token syntax error at the current token
    pub(crate) fn unexpected(&self, expectation: &str) -> UriqlError {
        let current = self.lexer.current_token();
        UriqlError::syntax_at(
            UQL0100,
            format!("Unexpected {current}; expected {expectation}"),
            self.lexer.text(),
            current.position(),
        )
    }

    /// Parse a slash-separated path
    ///
    /// Leaves the current token on the first token after the path. Each
    /// segment past the first counts against the recursion budget, matching
    /// the recursive-descent construction the grammar is bounded for. A
    /// lone trailing slash before a path terminator is tolerated for
    /// legacy clients.
    pub(crate) fn parse_path_segments(&mut self, in_select: bool) -> Result<Vec<PathSegment>> {
        let mut segments: Vec<PathSegment> = Vec::new();
        let mut extra_depth = 0usize;
        let result = loop {
            if !segments.is_empty() {
                if let Err(e) = self.recurse_enter() {
                    break Err(e);
                }
                extra_depth += 1;
            }
            let segment = match self.parse_one_segment(in_select) {
                Ok(segment) => segment,
                Err(e) => break Err(e),
            };
            let is_star = segment.identifier.ends_with('*');
            segments.push(segment);

            if self.lexer.current_token().kind != TokenKind::Slash {
                break Ok(());
            }
            if is_star {
                break Err(UriqlError::syntax_at(
                    UQL0103,
                    "A wildcard must be the last segment of the path",
                    self.lexer.text(),
                    self.lexer.current_token().position(),
                ));
            }
            if let Err(e) = self.lexer.next_token() {
                break Err(e);
            }
            // Trailing-slash tolerance: `A/B/` parses as `A/B`
            if is_path_boundary(self.lexer.current_token()) {
                break Ok(());
            }
        };
        for _ in 0..extra_depth {
            self.recurse_leave();
        }
        result.map(|()| segments)
    }

    fn parse_one_segment(&mut self, in_select: bool) -> Result<PathSegment> {
        let current = self.lexer.current_token().clone();
        let segment = match current.kind {
            TokenKind::SystemIdentifier => {
                return Err(UriqlError::syntax_at(
                    UQL0102,
                    format!(
                        "System token '{}' is not allowed in a select or expand path",
                        current.text
                    ),
                    self.lexer.text(),
                    current.position(),
                ));
            }
            TokenKind::Star if in_select => PathSegment::non_system("*"),
            TokenKind::Identifier => {
                let identifier = self.lexer.read_dotted_identifier(in_select)?;
                PathSegment::non_system(identifier)
            }
            _ => return Err(self.unexpected("a path segment")),
        };
        self.lexer.next_token()?;

        // Operation-call arguments are only legal in select paths; in an
        // expand path a parenthesis starts the option list instead
        if in_select
            && !segment.identifier.ends_with('*')
            && self.lexer.current_token().kind == TokenKind::OpenParen
        {
            let parameters = self.parse_named_parameters()?;
            return Ok(segment.with_parameters(parameters));
        }
        Ok(segment)
    }

    /// Parse `(name=literal,name=literal,...)` operation arguments
    fn parse_named_parameters(&mut self) -> Result<Vec<NamedParameter>> {
        self.lexer.next_token()?; // past '('
        let mut parameters = Vec::new();
        if self.lexer.current_token().kind != TokenKind::CloseParen {
            loop {
                let name_token = self.lexer.current_token().clone();
                if name_token.kind != TokenKind::Identifier {
                    return Err(self.unexpected("a parameter name"));
                }
                self.lexer.next_token()?;
                if self.lexer.current_token().kind != TokenKind::Equal {
                    return Err(self.unexpected("'='"));
                }
                self.lexer.next_token()?;
                let value = self.parse_literal()?;
                parameters.push(NamedParameter::new(name_token.text, value));

                if self.lexer.current_token().kind == TokenKind::Comma {
                    self.lexer.next_token()?;
                } else {
                    break;
                }
            }
        }
        if self.lexer.current_token().kind != TokenKind::CloseParen {
            return Err(self.unexpected("')'"));
        }
        self.lexer.next_token()?;
        Ok(parameters)
    }

    /// Parse one literal token
    pub(crate) fn parse_literal(&mut self) -> Result<Literal> {
        let current = self.lexer.current_token().clone();
        let literal = match current.kind {
            TokenKind::IntegerLiteral => {
                let value = current.text.parse::<i64>().map_err(|_| {
                    UriqlError::lexical(
                        UQL0004,
                        format!("Integer literal '{}' out of range", current.text),
                        self.lexer.text(),
                        current.position(),
                    )
                })?;
                Literal::Integer(value)
            }
            TokenKind::DecimalLiteral => {
                let value = current.text.parse().map_err(|_| {
                    UriqlError::lexical(
                        UQL0004,
                        format!("Decimal literal '{}' out of range", current.text),
                        self.lexer.text(),
                        current.position(),
                    )
                })?;
                Literal::Decimal(value)
            }
            TokenKind::StringLiteral => Literal::String(current.text),
            TokenKind::Identifier => match current.text.as_str() {
                "true" => Literal::Boolean(true),
                "false" => Literal::Boolean(false),
                "null" => Literal::Null,
                _ => {
                    return Err(UriqlError::syntax_at(
                        UQL0109,
                        format!("Expected literal, found identifier '{}'", current.text),
                        self.lexer.text(),
                        current.position(),
                    ));
                }
            },
            _ => return Err(self.unexpected("a literal")),
        };
        self.lexer.next_token()?;
        Ok(literal)
    }

    /// Parse select terms up to a term-list boundary (used for both the
    /// top-level clause and nested `$select=` options)
    pub(crate) fn parse_select_terms(&mut self) -> Result<SelectToken> {
        if is_term_list_boundary(self.lexer.current_token()) {
            return Ok(SelectToken::new());
        }
        let mut items = Vec::new();
        loop {
            self.recurse_enter()?;
            let segments = self.parse_path_segments(true)?;
            self.recurse_leave();
            items.push(chain_in_order(segments));

            if self.lexer.current_token().kind == TokenKind::Comma {
                self.lexer.next_token()?;
            } else {
                break;
            }
        }
        Ok(SelectToken::from_items(items))
    }

    /// Verify the whole clause was consumed
    pub(crate) fn expect_end(&self) -> Result<()> {
        let current = self.lexer.current_token();
        if !current.is_end() {
            return Err(UriqlError::syntax_at(
                uriql_diagnostics::UQL0110,
                format!("Expected end of clause, found {current}"),
                self.lexer.text(),
                current.position(),
            ));
        }
        Ok(())
    }
}

/// Tokens that may legally follow a path
pub(crate) fn is_path_boundary(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::End
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::CloseParen
            | TokenKind::OpenParen
    )
}

/// Tokens that end a comma-separated term list
pub(crate) fn is_term_list_boundary(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::End | TokenKind::Semicolon | TokenKind::CloseParen
    )
}

/// Link bare segments into a chain in clause order (`[A, B, C]` gives
/// `A/B/C`)
pub(crate) fn chain_in_order(segments: Vec<PathSegment>) -> PathSegment {
    segments
        .into_iter()
        .rev()
        .fold(None::<PathSegment>, |acc, mut segment| {
            segment.next = acc.map(Box::new);
            Some(segment)
        })
        .expect("a path has at least one segment")
}

/// Link bare segments into a reversed chain, the construction order of
/// recursive descent (`[A, B, C]` gives the chain `C -> B -> A`); the
/// normalizer's path inversion restores clause order
pub(crate) fn chain_reversed(segments: Vec<PathSegment>) -> PathSegment {
    segments
        .into_iter()
        .fold(None::<PathSegment>, |acc, mut segment| {
            segment.next = acc.map(Box::new);
            Some(segment)
        })
        .expect("a path has at least one segment")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn core(clause: &str) -> TermParserCore {
        TermParserCore::new(clause, 100, true).unwrap()
    }

    #[test]
    fn test_chain_builders() {
        let segments = vec![
            PathSegment::non_system("A"),
            PathSegment::non_system("B"),
            PathSegment::non_system("C"),
        ];
        assert_eq!(
            chain_in_order(segments.clone()).identifiers(),
            vec!["A", "B", "C"]
        );
        assert_eq!(chain_reversed(segments).identifiers(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_parse_path_with_cast_segment() {
        let mut c = core("Ns.Employee/Manager,");
        let segments = c.parse_path_segments(false).unwrap();
        let idents: Vec<_> = segments.iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(idents, vec!["Ns.Employee", "Manager"]);
        assert_eq!(c.lexer.current_token().kind, TokenKind::Comma);
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let mut c = core("A/B/");
        let segments = c.parse_path_segments(false).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(c.lexer.current_token().is_end());
    }

    #[test]
    fn test_star_must_be_terminal() {
        let mut c = core("*/Name");
        let err = c.parse_path_segments(true).unwrap_err();
        assert_eq!(err.code(), UQL0103);
    }

    #[test]
    fn test_dotted_star_must_be_terminal() {
        let mut c = core("Ns.*/Name");
        let err = c.parse_path_segments(true).unwrap_err();
        assert_eq!(err.code(), UQL0103);
    }

    #[test]
    fn test_system_token_rejected_in_path() {
        let mut c = core("A/$ref");
        let err = c.parse_path_segments(false).unwrap_err();
        assert_eq!(err.code(), UQL0102);
    }

    #[test]
    fn test_star_rejected_in_expand_path() {
        let mut c = core("*");
        let err = c.parse_path_segments(false).unwrap_err();
        assert_eq!(err.code(), UQL0100);
    }

    #[test]
    fn test_named_parameters_in_select_path() {
        let mut c = core("Compute(scale=2,label='x')");
        let segments = c.parse_path_segments(true).unwrap();
        assert_eq!(segments.len(), 1);
        let params = &segments[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "scale");
        assert_eq!(params[0].value, Literal::Integer(2));
        assert_eq!(params[1].value, Literal::String("x".into()));
    }

    #[test]
    fn test_path_segments_count_against_recursion_budget() {
        // First segment is free; B, C, D each enter one level
        let mut c = TermParserCore::new("A/B/C/D", 2, true).unwrap();
        let err = c.parse_path_segments(false).unwrap_err();
        assert_eq!(err.code(), UQL0101);

        let mut c = TermParserCore::new("A/B/C/D", 3, true).unwrap();
        assert_eq!(c.parse_path_segments(false).unwrap().len(), 4);
    }
}
