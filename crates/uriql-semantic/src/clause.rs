//! The bound select/expand tree
//!
//! [`Selection`] is a closed tagged union: `Unknown` is the "not yet
//! decided" state that exists only between the binder passes and the
//! finisher. The finisher's contract is to eliminate it; after
//! finishing, [`SelectExpandClause::is_fully_resolved`] holds at every
//! level.

use crate::{FilterClause, OrderByClause};
use std::sync::Arc;
use uriql_model::{EntitySet, EntityType, Property};

/// One entry of a partial selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// The `*` wildcard: all structural properties at this level
    Wildcard,
    /// A named property (structural, or a navigation reference)
    Property(String),
}

/// Selection state of one level of the tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Not yet decided; eliminated by the finisher and never visible to
    /// consumers of a finished clause
    #[default]
    Unknown,
    /// Everything at this level is selected
    All,
    /// Only the listed items are selected (possibly none)
    Partial(Vec<SelectItem>),
}

impl Selection {
    /// Whether the undecided state has been eliminated
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Selection::Unknown)
    }

    /// Whether everything at this level is selected
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Whether a named property is selected at this level
    pub fn selects_property(&self, name: &str) -> bool {
        match self {
            Selection::Unknown => false,
            Selection::All => true,
            Selection::Partial(items) => items
                .iter()
                .any(|item| matches!(item, SelectItem::Property(p) if p == name)),
        }
    }
}

/// The bound, per-level result of select/expand binding
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectExpandClause {
    /// What this level projects
    pub selection: Selection,
    /// The expanded navigation properties of this level
    pub expansion: Vec<ExpandedNavigationItem>,
}

impl SelectExpandClause {
    /// Create a clause
    pub fn new(selection: Selection, expansion: Vec<ExpandedNavigationItem>) -> Self {
        Self {
            selection,
            expansion,
        }
    }

    /// The undecided clause a binder starts from
    pub fn unresolved(expansion: Vec<ExpandedNavigationItem>) -> Self {
        Self {
            selection: Selection::Unknown,
            expansion,
        }
    }

    /// Whether no undecided selection remains anywhere in the tree
    pub fn is_fully_resolved(&self) -> bool {
        self.selection.is_resolved()
            && self
                .expansion
                .iter()
                .all(|item| item.select_and_expand.is_fully_resolved())
    }

    /// Whether everything at this level is selected
    pub fn all_selected(&self) -> bool {
        self.selection.is_all()
    }
}

/// One bound expansion: a navigation property together with its target
/// set and per-level options
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedNavigationItem {
    /// The level path as written, type-cast segments included
    pub path_to_navigation: Vec<String>,
    /// The resolved navigation property
    pub navigation: Property,
    /// Element type of the expansion target
    pub target_type: Arc<EntityType>,
    /// Entity set the expansion lands in, when resolvable (containment and
    /// open levels have none)
    pub target_set: Option<Arc<EntitySet>>,
    /// Bound `$filter` option
    pub filter: Option<FilterClause>,
    /// Bound `$orderby` option
    pub order_by: Option<OrderByClause>,
    /// `$top` option
    pub top: Option<u64>,
    /// `$skip` option
    pub skip: Option<u64>,
    /// `$count` option
    pub count: Option<bool>,
    /// The nested clause below this expansion
    pub select_and_expand: SelectExpandClause,
}

impl ExpandedNavigationItem {
    /// The navigation property's name
    pub fn navigation_name(&self) -> &str {
        &self.navigation.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_predicates() {
        assert!(!Selection::Unknown.is_resolved());
        assert!(Selection::All.is_resolved());
        assert!(Selection::All.selects_property("anything"));

        let partial = Selection::Partial(vec![SelectItem::Property("Name".into())]);
        assert!(partial.selects_property("Name"));
        assert!(!partial.selects_property("Other"));
        assert!(!Selection::Partial(vec![SelectItem::Wildcard]).selects_property("Name"));
    }

    #[test]
    fn test_unresolved_clause() {
        let clause = SelectExpandClause::unresolved(Vec::new());
        assert!(!clause.is_fully_resolved());
        let resolved = SelectExpandClause::new(Selection::All, Vec::new());
        assert!(resolved.is_fully_resolved());
    }
}
