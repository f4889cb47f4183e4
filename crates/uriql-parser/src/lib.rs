//! Syntactic front end of the uriql pipeline
//!
//! Tokenizes and parses `$select`/`$expand` clause text into the untyped
//! trees of `uriql-ast`, and normalizes parsed expand trees into the
//! canonical one-navigation-property-per-level shape the semantic binder
//! requires. Two grammar strategies are provided behind one contract: the
//! current, option-aware grammar and the legacy non-option grammar.

mod expression;
mod lexer;
mod normalizer;
mod select_expand;

pub use expression::{parse_filter_clause, parse_order_by_clause, ExpressionParser};
pub use lexer::ExpressionLexer;
pub use normalizer::{CombineOutcome, ExpandTreeNormalizer};
pub use select_expand::{NonOptionTermParser, OptionTermParser, TermParser};

use uriql_ast::{ExpandToken, GrammarMode, SelectToken};
use uriql_diagnostics::Result;

/// Parse a `$select` clause with the grammar the mode selects
pub fn parse_select(clause: &str, max_depth: usize, mode: GrammarMode) -> Result<SelectToken> {
    match mode {
        GrammarMode::Current => OptionTermParser::new(clause, max_depth)?.parse_select(),
        GrammarMode::Legacy => NonOptionTermParser::new(clause, max_depth)?.parse_select(),
    }
}

/// Parse an `$expand` clause with the grammar the mode selects
///
/// The returned tree is syntactic: path chains are still in construction
/// order and redundant terms are not yet merged. Run it through
/// [`ExpandTreeNormalizer::normalize_expand_tree`] before binding.
pub fn parse_expand(clause: &str, max_depth: usize, mode: GrammarMode) -> Result<ExpandToken> {
    match mode {
        GrammarMode::Current => OptionTermParser::new(clause, max_depth)?.parse_expand(),
        GrammarMode::Legacy => NonOptionTermParser::new(clause, max_depth)?.parse_expand(),
    }
}
