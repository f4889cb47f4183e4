//! Tree finisher
//!
//! Runs once both binder passes are complete: prunes expansion levels
//! that contribute nothing, then resolves every undecided selection into
//! a concrete one. After [`finish_select_expand_tree`] the clause is
//! fully resolved at every level and safe to hand to consumers.

use crate::{SelectExpandClause, Selection};
use uriql_ast::GrammarMode;

/// Prune, then resolve undecided selections
pub fn finish_select_expand_tree(
    clause: SelectExpandClause,
    mode: GrammarMode,
) -> SelectExpandClause {
    let pruned = prune_select_expand_tree(clause, mode);
    compute_final_selection(pruned, mode)
}

/// Remove expansion levels that contribute nothing
///
/// Under the legacy grammar, selection governs the whole projection: when
/// a level has a partial selection, an expanded child survives only if
/// the selection names its navigation property or something in the
/// child's own subtree is selected or expanded. The current grammar
/// treats `$expand` as independent of `$select`, so explicit expansions
/// are never pruned there.
pub fn prune_select_expand_tree(
    mut clause: SelectExpandClause,
    mode: GrammarMode,
) -> SelectExpandClause {
    clause.expansion = clause
        .expansion
        .into_iter()
        .map(|mut item| {
            item.select_and_expand = prune_select_expand_tree(item.select_and_expand, mode);
            item
        })
        .collect();

    if mode == GrammarMode::Legacy {
        if let Selection::Partial(_) = &clause.selection {
            let selection = clause.selection.clone();
            clause
                .expansion
                .retain(|item| {
                    selection.selects_property(item.navigation_name())
                        || subtree_contributes(&item.select_and_expand)
                });
        }
    }
    clause
}

/// Whether anything below this clause is selected or expanded
///
/// Runs on the pre-resolution tree, where an undecided selection still
/// means "nothing was asked for here".
fn subtree_contributes(clause: &SelectExpandClause) -> bool {
    let selected = match &clause.selection {
        Selection::Unknown => false,
        Selection::All => true,
        Selection::Partial(items) => !items.is_empty(),
    };
    selected || !clause.expansion.is_empty()
}

/// Resolve every undecided selection into a concrete variant
///
/// The defaulting rule is the grammar's: the current grammar selects
/// nothing at a level unless a `$select` says otherwise; the legacy
/// grammar selects everything.
pub fn compute_final_selection(
    mut clause: SelectExpandClause,
    mode: GrammarMode,
) -> SelectExpandClause {
    if let Selection::Unknown = clause.selection {
        clause.selection = match mode {
            GrammarMode::Current => Selection::Partial(Vec::new()),
            GrammarMode::Legacy => Selection::All,
        };
    }
    clause.expansion = clause
        .expansion
        .into_iter()
        .map(|mut item| {
            item.select_and_expand = compute_final_selection(item.select_and_expand, mode);
            item
        })
        .collect();
    debug_assert!(clause.selection.is_resolved());
    clause
}
