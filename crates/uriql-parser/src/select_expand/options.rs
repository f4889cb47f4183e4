//! Option-aware term parser (current grammar)
//!
//! After each expand term's path an optional parenthesized, `;`-separated
//! option list is recognized: `$filter=`, `$orderby=`, `$top=`, `$skip=`,
//! `$count=`, `$select=`, `$expand=`. Filter/orderby delegate to the
//! expression parser over the same lexer; nested select/expand recurse into
//! this parser one level deeper.

use uriql_ast::{ExpandTermToken, ExpandToken, SelectToken, TokenKind};
use uriql_diagnostics::{Result, UriqlError, UQL0105, UQL0106, UQL0107, UQL0108};

use crate::expression::ExpressionParser;
use crate::select_expand::{
    chain_reversed, is_term_list_boundary, TermParser, TermParserCore,
};

/// Term parser for the current, option-aware grammar
#[derive(Debug)]
pub struct OptionTermParser {
    core: TermParserCore,
}

impl OptionTermParser {
    /// Create a parser over a clause with the given recursion limit
    pub fn new(clause: &str, max_depth: usize) -> Result<Self> {
        Ok(Self {
            core: TermParserCore::new(clause, max_depth, true)?,
        })
    }

    fn parse_expand_terms(&mut self) -> Result<ExpandToken> {
        if is_term_list_boundary(self.core.lexer.current_token()) {
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
        Ok(ExpandToken::from_terms(terms))
    }

    fn parse_expand_term(&mut self) -> Result<ExpandTermToken> {
        self.core.recurse_enter()?;
        let result = self.parse_expand_term_inner();
        self.core.recurse_leave();
        result
    }

    fn parse_expand_term_inner(&mut self) -> Result<ExpandTermToken> {
        let segments = self.core.parse_path_segments(false)?;
        let mut term = ExpandTermToken::new(chain_reversed(segments));
        if self.core.lexer.current_token().kind == TokenKind::OpenParen {
            self.parse_options(&mut term)?;
        }
        Ok(term)
    }

    fn parse_options(&mut self, term: &mut ExpandTermToken) -> Result<()> {
        self.core.lexer.next_token()?; // past '('
        if self.core.lexer.current_token().kind == TokenKind::CloseParen {
            self.core.lexer.next_token()?;
            return Ok(());
        }
        loop {
            self.parse_one_option(term)?;
            match self.core.lexer.current_token().kind {
                TokenKind::Semicolon => {
                    self.core.lexer.next_token()?;
                }
                TokenKind::CloseParen => {
                    self.core.lexer.next_token()?;
                    return Ok(());
                }
                TokenKind::End => {
                    return Err(UriqlError::syntax_at(
                        UQL0105,
                        "Missing ')' after expand options",
                        self.core.lexer.text(),
                        self.core.lexer.current_token().position(),
                    ));
                }
                _ => return Err(self.core.unexpected("';' or ')'")),
            }
        }
    }

    fn parse_one_option(&mut self, term: &mut ExpandTermToken) -> Result<()> {
        let option = self.core.lexer.current_token().clone();
        if option.kind != TokenKind::SystemIdentifier {
            return Err(self.core.unexpected("a query option like '$filter'"));
        }
        self.core.lexer.next_token()?;
        if self.core.lexer.current_token().kind != TokenKind::Equal {
            return Err(self.core.unexpected("'='"));
        }
        self.core.lexer.next_token()?;

        match option.text.as_str() {
            "$filter" => {
                self.check_duplicate(term.filter.is_some(), &option.text, option.position())?;
                let max_depth = self.core.max_depth();
                let expr =
                    ExpressionParser::new(&mut self.core.lexer, max_depth).parse_expression()?;
                term.filter = Some(expr);
            }
            "$orderby" => {
                self.check_duplicate(term.order_by.is_some(), &option.text, option.position())?;
                let max_depth = self.core.max_depth();
                let items =
                    ExpressionParser::new(&mut self.core.lexer, max_depth).parse_order_by()?;
                term.order_by = Some(items);
            }
            "$top" => {
                self.check_duplicate(term.top.is_some(), &option.text, option.position())?;
                term.top = Some(self.parse_non_negative_integer(&option.text)?);
            }
            "$skip" => {
                self.check_duplicate(term.skip.is_some(), &option.text, option.position())?;
                term.skip = Some(self.parse_non_negative_integer(&option.text)?);
            }
            "$count" => {
                self.check_duplicate(term.count.is_some(), &option.text, option.position())?;
                term.count = Some(self.parse_boolean(&option.text)?);
            }
            "$select" => {
                self.check_duplicate(term.select.is_some(), &option.text, option.position())?;
                term.select = Some(self.core.parse_select_terms()?);
            }
            "$expand" => {
                self.check_duplicate(term.expand.is_some(), &option.text, option.position())?;
                term.expand = Some(self.parse_expand_terms()?);
            }
            _ => {
                return Err(UriqlError::syntax_at(
                    UQL0106,
                    format!("Unknown query option '{}'", option.text),
                    self.core.lexer.text(),
                    option.position(),
                ));
            }
        }
        Ok(())
    }

    fn check_duplicate(&self, already_set: bool, option: &str, position: usize) -> Result<()> {
        if already_set {
            return Err(UriqlError::syntax_at(
                UQL0107,
                format!("Query option '{option}' given more than once"),
                self.core.lexer.text(),
                position,
            ));
        }
        Ok(())
    }

    fn parse_non_negative_integer(&mut self, option: &str) -> Result<u64> {
        let current = self.core.lexer.current_token().clone();
        let value = if current.kind == TokenKind::IntegerLiteral {
            current.text.parse::<u64>().ok()
        } else {
            None
        };
        let Some(value) = value else {
            return Err(UriqlError::syntax_at(
                UQL0108,
                format!(
                    "'{option}' requires a non-negative integer, found '{}'",
                    current.text
                ),
                self.core.lexer.text(),
                current.position(),
            ));
        };
        self.core.lexer.next_token()?;
        Ok(value)
    }

    fn parse_boolean(&mut self, option: &str) -> Result<bool> {
        let current = self.core.lexer.current_token().clone();
        let value = match current.text.as_str() {
            "true" if current.kind == TokenKind::Identifier => true,
            "false" if current.kind == TokenKind::Identifier => false,
            _ => {
                return Err(UriqlError::syntax_at(
                    UQL0108,
                    format!("'{option}' requires 'true' or 'false', found '{}'", current.text),
                    self.core.lexer.text(),
                    current.position(),
                ));
            }
        };
        self.core.lexer.next_token()?;
        Ok(value)
    }
}

impl TermParser for OptionTermParser {
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
        let token = self.parse_expand_terms()?;
        self.core.expect_end()?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uriql_ast::{BinaryOp, Expression};
    use uriql_diagnostics::UQL0101;

    fn parse_expand(clause: &str) -> ExpandToken {
        OptionTermParser::new(clause, 100)
            .unwrap()
            .parse_expand()
            .unwrap_or_else(|e| panic!("Failed to parse '{clause}': {e}"))
    }

    fn parse_select(clause: &str) -> SelectToken {
        OptionTermParser::new(clause, 100)
            .unwrap()
            .parse_select()
            .unwrap_or_else(|e| panic!("Failed to parse '{clause}': {e}"))
    }

    #[test]
    fn test_empty_clauses_yield_empty_tokens() {
        assert!(parse_expand("").is_empty());
        assert!(parse_select("").is_empty());
    }

    #[test]
    fn test_multi_segment_path_is_reversed() {
        let token = parse_expand("A/B/C");
        assert_eq!(token.terms.len(), 1);
        // Recursive-descent construction order: deepest segment first
        assert_eq!(token.terms[0].path.identifiers(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_term_with_all_options() {
        let token =
            parse_expand("Orders($filter=Amount gt 10;$orderby=Placed desc;$top=5;$skip=2;$count=true;$select=Amount;$expand=Items)");
        let term = &token.terms[0];
        assert_eq!(term.path.identifiers(), vec!["Orders"]);
        assert_eq!(term.top, Some(5));
        assert_eq!(term.skip, Some(2));
        assert_eq!(term.count, Some(true));
        match term.filter.as_ref().unwrap() {
            Expression::Binary(b) => assert_eq!(b.op, BinaryOp::Gt),
            _ => panic!("Expected Binary filter"),
        }
        assert_eq!(term.order_by.as_ref().unwrap().len(), 1);
        assert_eq!(term.select.as_ref().unwrap().items.len(), 1);
        assert_eq!(term.expand.as_ref().unwrap().terms.len(), 1);
    }

    #[test]
    fn test_nested_expand_terms() {
        let token = parse_expand("A($expand=B($expand=C))");
        let a = &token.terms[0];
        let b = &a.expand.as_ref().unwrap().terms[0];
        let c = &b.expand.as_ref().unwrap().terms[0];
        assert_eq!(c.path.identifiers(), vec!["C"]);
    }

    #[test]
    fn test_multiple_terms_preserve_order() {
        let token = parse_expand("B,A,C");
        let idents: Vec<_> = token
            .terms
            .iter()
            .map(|t| t.path.identifiers()[0].to_owned())
            .collect();
        assert_eq!(idents, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_duplicate_option_rejected() {
        let err = OptionTermParser::new("Orders($top=5;$top=6)", 100)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0107);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = OptionTermParser::new("Orders($levels=3)", 100)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0106);
    }

    #[test]
    fn test_negative_top_rejected() {
        let err = OptionTermParser::new("Orders($top=-1)", 100)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0108);
    }

    #[test]
    fn test_count_requires_boolean() {
        let err = OptionTermParser::new("Orders($count=yes)", 100)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0108);
    }

    #[test]
    fn test_unterminated_options() {
        let err = OptionTermParser::new("Orders($top=5", 100)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0105);
    }

    #[test]
    fn test_empty_option_list_allowed() {
        let token = parse_expand("Orders()");
        assert!(!token.terms[0].has_options());
    }

    #[test]
    fn test_nesting_depth_boundary() {
        // Three levels of terms at limit 3: succeeds
        assert_eq!(
            parse_expand("A($expand=B($expand=C))").terms.len(),
            1
        );
        let ok = OptionTermParser::new("A($expand=B($expand=C))", 3)
            .unwrap()
            .parse_expand();
        assert!(ok.is_ok());

        // Four levels at limit 3: recursion limit error
        let err = OptionTermParser::new("A($expand=B($expand=C($expand=D)))", 3)
            .unwrap()
            .parse_expand()
            .unwrap_err();
        assert_eq!(err.code(), UQL0101);
        assert_eq!(err.clause(), Some("A($expand=B($expand=C($expand=D)))"));
    }

    #[test]
    fn test_select_star() {
        let token = parse_select("*");
        assert_eq!(token.items[0].identifier, "*");
    }

    #[test]
    fn test_select_duplicates_preserved_at_parse_time() {
        // Dedup happens at bind time, not parse time
        let token = parse_select("Name,Name");
        assert_eq!(token.items.len(), 2);
    }

    #[test]
    fn test_select_paths_in_clause_order() {
        let token = parse_select("Orders/Amount,Name");
        assert_eq!(token.items[0].identifiers(), vec!["Orders", "Amount"]);
        assert_eq!(token.items[1].identifiers(), vec!["Name"]);
    }
}
