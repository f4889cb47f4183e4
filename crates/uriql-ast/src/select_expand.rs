//! `$select` and `$expand` term tokens
//!
//! The untyped output of the syntactic parsers. A [`SelectToken`] is an
//! ordered list of paths; an [`ExpandToken`] is an ordered list of
//! [`ExpandTermToken`]s, each a path plus the per-term options the current
//! grammar allows. Order is preserved end to end so downstream output is
//! stable.

use crate::{Expression, OrderByToken, PathSegment};

/// Which grammar variant a clause is written in
///
/// The legacy grammar predates per-term expand options; the current grammar
/// allows a parenthesized option list after each expand term. The variant
/// also selects the binder's defaulting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarMode {
    /// Option-aware grammar with nested `$filter`/`$orderby`/`$top`/`$skip`/
    /// `$count`/`$select`/`$expand` per expand term
    #[default]
    Current,
    /// Non-option grammar: terms are bare slash-separated paths
    Legacy,
}

/// A parsed `$select` clause: ordered property/wildcard paths
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectToken {
    /// Selected paths, in clause order
    pub items: Vec<PathSegment>,
}

impl SelectToken {
    /// Create an empty select token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a select token from paths
    pub fn from_items(items: Vec<PathSegment>) -> Self {
        Self { items }
    }

    /// Whether no paths were given
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A parsed `$expand` clause: ordered expand terms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpandToken {
    /// Expand terms, in clause order
    pub terms: Vec<ExpandTermToken>,
}

impl ExpandToken {
    /// Create an empty expand token
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expand token from terms
    pub fn from_terms(terms: Vec<ExpandTermToken>) -> Self {
        Self { terms }
    }

    /// Whether no terms were given
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One `$expand` term before metadata binding: a navigation path plus
/// optional per-term options
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandTermToken {
    /// Path to the navigation property
    pub path: PathSegment,
    /// `$filter` option
    pub filter: Option<Expression>,
    /// `$orderby` option
    pub order_by: Option<Vec<OrderByToken>>,
    /// `$top` option
    pub top: Option<u64>,
    /// `$skip` option
    pub skip: Option<u64>,
    /// `$count` option
    pub count: Option<bool>,
    /// Nested `$select` option
    pub select: Option<SelectToken>,
    /// Nested `$expand` option
    pub expand: Option<ExpandToken>,
}

impl ExpandTermToken {
    /// Create a term with a path and no options
    pub fn new(path: PathSegment) -> Self {
        Self {
            path,
            filter: None,
            order_by: None,
            top: None,
            skip: None,
            count: None,
            select: None,
            expand: None,
        }
    }

    /// Replace the path, keeping all options
    pub fn with_path(mut self, path: PathSegment) -> Self {
        self.path = path;
        self
    }

    /// Set the nested expand option
    pub fn with_expand(mut self, expand: ExpandToken) -> Self {
        self.expand = Some(expand);
        self
    }

    /// Set the nested select option
    pub fn with_select(mut self, select: SelectToken) -> Self {
        self.select = Some(select);
        self
    }

    /// Whether any per-term option is present
    pub fn has_options(&self) -> bool {
        self.filter.is_some()
            || self.order_by.is_some()
            || self.top.is_some()
            || self.skip.is_some()
            || self.count.is_some()
            || self.select.is_some()
            || self.expand.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_without_options() {
        let term = ExpandTermToken::new(PathSegment::non_system("Orders"));
        assert!(!term.has_options());
    }

    #[test]
    fn test_term_with_nested_expand() {
        let inner = ExpandToken::from_terms(vec![ExpandTermToken::new(PathSegment::non_system(
            "Items",
        ))]);
        let term = ExpandTermToken::new(PathSegment::non_system("Orders")).with_expand(inner);
        assert!(term.has_options());
        assert_eq!(term.expand.as_ref().unwrap().terms.len(), 1);
    }
}
