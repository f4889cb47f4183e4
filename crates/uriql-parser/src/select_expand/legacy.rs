//! Non-option term parser (legacy grammar)
//!
//! Each select/expand term is exactly a slash-separated path terminated by a
//! comma or end of clause. Any option syntax is a syntax error; semicolons
//! are not delimiters in this grammar at all.

use uriql_ast::{ExpandTermToken, ExpandToken, SelectToken, TokenKind};
use uriql_diagnostics::Result;

use crate::select_expand::{chain_reversed, TermParser, TermParserCore};

/// Term parser for the legacy, non-option grammar
#[derive(Debug)]
pub struct NonOptionTermParser {
    core: TermParserCore,
}

impl NonOptionTermParser {
    /// Create a parser over a clause with the given recursion limit
    pub fn new(clause: &str, max_depth: usize) -> Result<Self> {
        Ok(Self {
            core: TermParserCore::new(clause, max_depth, false)?,
        })
    }

    fn parse_expand_term(&mut self) -> Result<ExpandTermToken> {
        self.core.recurse_enter()?;
        let result = self.core.parse_path_segments(false);
        self.core.recurse_leave();
        let segments = result?;

        if self.core.lexer.current_token().kind == TokenKind::OpenParen {
            return Err(self.core.unexpected("',' or end of clause (this grammar has no expand options)"));
        }
        Ok(ExpandTermToken::new(chain_reversed(segments)))
    }
}

impl TermParser for NonOptionTermParser {
    fn parse_select(&mut self) -> Result<SelectToken> {
        if self.core.lexer.current_token().is_end() {
            return Ok(SelectToken::new());
        }
        let token = self.core.parse_select_terms()?;
        self.core.expect_end()?;
        Ok(token)
    }

    fn parse_expand(&mut self) -> Result<ExpandToken> {
        if self.core.lexer.current_token().is_end() {
            return Ok(ExpandToken::new());
        }
        let mut terms = Vec::new();
        loop {
            terms.push(self.parse_expand_term()?);
            if self.core.lexer.current_token().kind == TokenKind::Comma {
                self.core.lexer.next_token()?;
            } else {
                break;
            }
        }
        self.core.expect_end()?;
        Ok(ExpandToken::from_terms(terms))
    }
}
