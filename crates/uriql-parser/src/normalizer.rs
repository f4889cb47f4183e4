//! Expand tree normalizer
//!
//! The wire grammar allows the same expansion to be written several ways:
//! `$expand=A($expand=B)` and `$expand=A/B` are equivalent, and repeating
//! `$expand=A,A($select=X)` means "expand A, and additionally select X
//! within it". Normalization rewrites every such tree into one canonical
//! shape, one navigation property per level with deduplicated children, so
//! the binder never needs its own reconciliation logic.
//!
//! Passes, in order:
//! 1. [`ExpandTreeNormalizer::invert_paths`] restores clause order on path
//!    chains built in recursive-descent construction order.
//! 2. [`ExpandTreeNormalizer::build_sub_expand_tree`] splits multi-segment
//!    paths into nested single-navigation-property levels (type-cast
//!    segments stay attached to the navigation segment they qualify).
//! 3. [`ExpandTreeNormalizer::combine_terms`] merges terms that target the
//!    same navigation property, recursively unioning their children.
//!
//! The whole rewrite is idempotent: normalizing an already-normalized tree
//! returns it unchanged.

use indexmap::IndexMap;
use uriql_ast::{ExpandTermToken, ExpandToken, PathSegment, SelectToken};

use crate::select_expand::chain_in_order;

/// Rewrites parsed expand trees into the canonical shape the binder
/// requires
#[derive(Debug, Default)]
pub struct ExpandTreeNormalizer;

/// Result of attempting to merge two expand terms
#[derive(Debug)]
pub enum CombineOutcome {
    /// Both terms referenced the same navigation property and were merged
    Merged(ExpandTermToken),
    /// The terms target different navigation properties; both are returned
    /// unchanged
    Unrelated(ExpandTermToken, ExpandTermToken),
}

impl ExpandTreeNormalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self
    }

    /// Top-level entry: rewrite a parsed tree into canonical form
    pub fn normalize_expand_tree(&self, tree: ExpandToken) -> ExpandToken {
        let inverted = self.invert_paths(tree);
        self.combine_expand(inverted)
    }

    /// Restore clause order on every path chain in the tree
    ///
    /// Parsed chains arrive deepest-segment-first. Each chain is rebuilt
    /// (never rewired in place) unless it is already in canonical
    /// casts-before-navigation order, which keeps the pass idempotent.
    pub fn invert_paths(&self, tree: ExpandToken) -> ExpandToken {
        let terms = tree
            .terms
            .into_iter()
            .map(|term| {
                let ExpandTermToken {
                    path,
                    filter,
                    order_by,
                    top,
                    skip,
                    count,
                    select,
                    expand,
                } = term;
                let path = if path_is_canonical(&path) {
                    path
                } else {
                    path.reversed()
                };
                ExpandTermToken {
                    path,
                    filter,
                    order_by,
                    top,
                    skip,
                    count,
                    select,
                    expand: expand.map(|nested| self.invert_paths(nested)),
                }
            })
            .collect();
        ExpandToken::from_terms(terms)
    }

    /// Split a term whose path spans several navigation properties into
    /// nested single-level terms
    ///
    /// `A/B/C` becomes a term for `A` whose expand option is a singleton
    /// tree for `B`, whose expand option is a singleton tree for `C`. All
    /// options of the original term stay on the innermost level. Type-cast
    /// segments (`Ns.Derived/Nav`) remain glued to the navigation segment
    /// they qualify.
    pub fn build_sub_expand_tree(&self, term: ExpandTermToken) -> ExpandTermToken {
        let mut levels = split_path_levels(&term.path);
        let innermost_path = levels.pop().expect("a path has at least one level");

        let ExpandTermToken {
            path: _,
            filter,
            order_by,
            top,
            skip,
            count,
            select,
            expand,
        } = term;
        let mut current = ExpandTermToken {
            path: innermost_path,
            filter,
            order_by,
            top,
            skip,
            count,
            select,
            expand: expand.map(|nested| self.combine_expand(nested)),
        };
        for level_path in levels.into_iter().rev() {
            current = ExpandTermToken::new(level_path)
                .with_expand(ExpandToken::from_terms(vec![current]));
        }
        current
    }

    /// Merge two single-level terms that reference the same navigation
    /// property
    ///
    /// Child expand trees are unioned recursively, keyed by
    /// navigation-property identity; select lists are concatenated (the
    /// binder deduplicates); scalar options keep the first term's value
    /// when both are present. Terms with different targets are returned
    /// unchanged.
    pub fn combine_terms(
        &self,
        existing: ExpandTermToken,
        new: ExpandTermToken,
    ) -> CombineOutcome {
        if navigation_key(&existing.path) != navigation_key(&new.path) {
            return CombineOutcome::Unrelated(existing, new);
        }
        let children = self.combine_child_nodes(&existing, &new);
        CombineOutcome::Merged(ExpandTermToken {
            path: existing.path,
            filter: existing.filter.or(new.filter),
            order_by: existing.order_by.or(new.order_by),
            top: existing.top.or(new.top),
            skip: existing.skip.or(new.skip),
            count: existing.count.or(new.count),
            select: merge_selects(existing.select, new.select),
            expand: if children.is_empty() {
                None
            } else {
                Some(ExpandToken::from_terms(children))
            },
        })
    }

    /// Union the child expand terms of two terms, merging children that
    /// target the same navigation property
    pub fn combine_child_nodes(
        &self,
        existing: &ExpandTermToken,
        new: &ExpandTermToken,
    ) -> Vec<ExpandTermToken> {
        let mut merged: IndexMap<String, ExpandTermToken> = IndexMap::new();
        let children = existing
            .expand
            .iter()
            .chain(new.expand.iter())
            .flat_map(|tree| tree.terms.iter().cloned());
        for child in children {
            self.merge_into(&mut merged, child);
        }
        merged.into_values().collect()
    }

    fn combine_expand(&self, tree: ExpandToken) -> ExpandToken {
        let mut merged: IndexMap<String, ExpandTermToken> = IndexMap::new();
        for term in tree.terms {
            let term = self.build_sub_expand_tree(term);
            self.merge_into(&mut merged, term);
        }
        ExpandToken::from_terms(merged.into_values().collect())
    }

    /// Insert a term into the merge map, combining with an existing entry
    /// for the same navigation property; first-seen order is preserved
    fn merge_into(&self, map: &mut IndexMap<String, ExpandTermToken>, term: ExpandTermToken) {
        let key = navigation_key(&term.path);
        match map.get_mut(&key) {
            Some(existing) => {
                let placeholder = ExpandTermToken::new(PathSegment::non_system(""));
                let current = std::mem::replace(existing, placeholder);
                match self.combine_terms(current, term) {
                    CombineOutcome::Merged(merged) => *existing = merged,
                    CombineOutcome::Unrelated(current, _) => {
                        // Keys matched, so targets are identical; unreachable
                        // but restore the original entry rather than lose it
                        *existing = current;
                    }
                }
            }
            None => {
                map.insert(key, term);
            }
        }
    }
}

/// The navigation-property identity of a level path
fn navigation_key(path: &PathSegment) -> String {
    path.identifiers().join("/")
}

/// Whether a chain is already in canonical casts-before-navigation order:
/// every segment but the last namespace-qualified, the last one plain
fn path_is_canonical(path: &PathSegment) -> bool {
    let identifiers = path.identifiers();
    let (last, leading) = identifiers.split_last().expect("chain is never empty");
    !last.contains('.') && leading.iter().all(|ident| ident.contains('.'))
}

/// Group a clause-order path into per-level chains: each level is zero or
/// more type-cast segments followed by one navigation segment
fn split_path_levels(path: &PathSegment) -> Vec<PathSegment> {
    let mut levels = Vec::new();
    let mut group: Vec<PathSegment> = Vec::new();
    for segment in path.segments() {
        let bare = PathSegment {
            kind: segment.kind,
            identifier: segment.identifier.clone(),
            parameters: segment.parameters.clone(),
            next: None,
        };
        let qualified = bare.identifier.contains('.');
        group.push(bare);
        if !qualified {
            levels.push(chain_in_order(std::mem::take(&mut group)));
        }
    }
    if !group.is_empty() {
        // A path ending in cast segments only; kept as its own level for the
        // binder to report
        levels.push(chain_in_order(group));
    }
    levels
}

fn merge_selects(a: Option<SelectToken>, b: Option<SelectToken>) -> Option<SelectToken> {
    match (a, b) {
        (Some(mut a), Some(b)) => {
            a.items.extend(b.items);
            Some(a)
        }
        (a, b) => a.or(b),
    }
}
