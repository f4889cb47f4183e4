//! Expansion depth and count validator
//!
//! The resource-exhaustion guard of the pipeline. It walks the finished
//! tree, so the limits measure the normalized shape: a deeply redundant
//! input the normalizer collapsed does not trip them.

use crate::SelectExpandClause;
use uriql_diagnostics::{Result, UriqlError, UQL0300, UQL0301};

/// Validates configured expansion limits over a finished clause
#[derive(Debug, Clone)]
pub struct ExpandDepthAndCountValidator {
    max_depth: usize,
    max_count: usize,
}

impl ExpandDepthAndCountValidator {
    /// Create a validator with the configured limits
    pub fn new(max_depth: usize, max_count: usize) -> Self {
        Self {
            max_depth,
            max_count,
        }
    }

    /// Walk the tree, enforcing both limits
    pub fn validate(&self, clause: &SelectExpandClause) -> Result<()> {
        let mut count = 0usize;
        self.walk(clause, 0, &mut count)
    }

    fn walk(&self, clause: &SelectExpandClause, depth: usize, count: &mut usize) -> Result<()> {
        for item in &clause.expansion {
            let item_depth = depth + 1;
            if item_depth > self.max_depth {
                return Err(UriqlError::limit(
                    UQL0300,
                    format!(
                        "Expansion depth exceeds the configured maximum of {}",
                        self.max_depth
                    ),
                ));
            }
            *count += 1;
            if *count > self.max_count {
                return Err(UriqlError::limit(
                    UQL0301,
                    format!(
                        "Expansion count exceeds the configured maximum of {}",
                        self.max_count
                    ),
                ));
            }
            self.walk(&item.select_and_expand, item_depth, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExpandedNavigationItem, Selection};
    use std::sync::Arc;
    use uriql_model::{EntityTypeBuilder, Multiplicity, Property};

    fn chain(depth: usize) -> SelectExpandClause {
        let ty = Arc::new(EntityTypeBuilder::new("Ns", "Node").build());
        let mut clause = SelectExpandClause::new(Selection::All, Vec::new());
        for _ in 0..depth {
            clause = SelectExpandClause::new(
                Selection::All,
                vec![ExpandedNavigationItem {
                    path_to_navigation: vec!["Next".into()],
                    navigation: Property::navigation("Next", "Ns.Node", Multiplicity::ZeroOrOne),
                    target_type: ty.clone(),
                    target_set: None,
                    filter: None,
                    order_by: None,
                    top: None,
                    skip: None,
                    count: None,
                    select_and_expand: clause,
                }],
            );
        }
        clause
    }

    fn wide(count: usize) -> SelectExpandClause {
        let ty = Arc::new(EntityTypeBuilder::new("Ns", "Node").build());
        let items = (0..count)
            .map(|i| ExpandedNavigationItem {
                path_to_navigation: vec![format!("Nav{i}")],
                navigation: Property::navigation(
                    format!("Nav{i}"),
                    "Ns.Node",
                    Multiplicity::Many,
                ),
                target_type: ty.clone(),
                target_set: None,
                filter: None,
                order_by: None,
                top: None,
                skip: None,
                count: None,
                select_and_expand: SelectExpandClause::new(Selection::All, Vec::new()),
            })
            .collect();
        SelectExpandClause::new(Selection::All, items)
    }

    #[test]
    fn test_depth_boundary_both_ways() {
        let validator = ExpandDepthAndCountValidator::new(3, usize::MAX);
        assert!(validator.validate(&chain(3)).is_ok());
        let err = validator.validate(&chain(4)).unwrap_err();
        assert_eq!(err.code(), UQL0300);
    }

    #[test]
    fn test_count_boundary_both_ways() {
        let validator = ExpandDepthAndCountValidator::new(usize::MAX, 4);
        assert!(validator.validate(&wide(4)).is_ok());
        let err = validator.validate(&wide(5)).unwrap_err();
        assert_eq!(err.code(), UQL0301);
    }

    #[test]
    fn test_count_accumulates_across_levels() {
        // A depth-3 chain holds 3 items in total
        let validator = ExpandDepthAndCountValidator::new(usize::MAX, 2);
        let err = validator.validate(&chain(3)).unwrap_err();
        assert_eq!(err.code(), UQL0301);
    }

    #[test]
    fn test_empty_clause_passes() {
        let validator = ExpandDepthAndCountValidator::new(0, 0);
        assert!(validator.validate(&chain(0)).is_ok());
    }
}
