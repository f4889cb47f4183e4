//! Expand binder
//!
//! Walks a normalized expand tree against the model, resolving each
//! level's navigation property, target entity set and per-term options
//! into [`ExpandedNavigationItem`]s. One binder instance exists per
//! expansion depth; recursing into a nested expand creates a fresh binder
//! scoped to the target type and set.

use crate::{
    BindingSettings, ExpandedNavigationItem, ExpressionBinder, RangeVariable, SelectBinder,
    SelectExpandClause,
};
use std::sync::Arc;
use uriql_ast::{ExpandTermToken, ExpandToken};
use uriql_diagnostics::{
    Result, UriqlError, UQL0200, UQL0201, UQL0202, UQL0203, UQL0204, UQL0207,
};
use uriql_model::{EdmModel, EntitySet, EntityType, PropertyKind};

/// Binds one level of a normalized expand tree
#[derive(Debug)]
pub struct ExpandBinder<'m> {
    model: &'m EdmModel,
    entity_type: Arc<EntityType>,
    entity_set: Option<Arc<EntitySet>>,
    settings: &'m BindingSettings,
}

impl<'m> ExpandBinder<'m> {
    /// Create a binder for one expansion level
    pub fn new(
        model: &'m EdmModel,
        entity_type: Arc<EntityType>,
        entity_set: Option<Arc<EntitySet>>,
        settings: &'m BindingSettings,
    ) -> Self {
        Self {
            model,
            entity_type,
            entity_set,
            settings,
        }
    }

    /// Bind a normalized expand token
    ///
    /// The returned clause's selection is still undecided; the select
    /// binder and the finisher settle it.
    pub fn bind(&self, expand: &ExpandToken) -> Result<SelectExpandClause> {
        let mut expansion = Vec::new();
        for term in &expand.terms {
            if let Some(item) = self.generate_expand_item(term)? {
                expansion.push(item);
            }
        }
        Ok(SelectExpandClause::unresolved(expansion))
    }

    /// Bind one expand term into an expanded item
    ///
    /// Returns `None` only for the server-compatibility dropping shim.
    fn generate_expand_item(&self, term: &ExpandTermToken) -> Result<Option<ExpandedNavigationItem>> {
        let identifiers = term.path.identifiers();
        let (navigation_name, cast_segments) = identifiers
            .split_last()
            .expect("a path has at least one segment");

        // The normalizer guarantees one navigation property per level:
        // only type-cast (dotted) segments may precede it. Anything else
        // means this binder was handed a tree that skipped normalization.
        if cast_segments.iter().any(|segment| !segment.contains('.')) {
            return Err(UriqlError::binding(
                UQL0202,
                format!(
                    "Expand tree is not normalized: level path '{}' spans more than one navigation property",
                    identifiers.join("/")
                ),
            ));
        }
        if navigation_name.contains('.') {
            return Err(UriqlError::binding(
                UQL0207,
                format!(
                    "Expand path '{}' must end in a navigation property",
                    identifiers.join("/")
                ),
            ));
        }

        // Leading casts narrow the type the navigation property is
        // resolved against
        let mut current_type = self.entity_type.clone();
        for cast in cast_segments {
            let cast_type = self.model.entity_type(cast).ok_or_else(|| {
                UriqlError::binding(UQL0204, format!("Unknown type '{cast}'"))
            })?;
            if !self.model.are_related(&current_type.qualified_name(), cast) {
                return Err(UriqlError::binding(
                    UQL0203,
                    format!(
                        "Type '{cast}' is not related to type '{}'",
                        current_type.qualified_name()
                    ),
                ));
            }
            current_type = cast_type;
        }

        let property = self
            .model
            .resolve_property(&current_type, navigation_name)
            .ok_or_else(|| {
                UriqlError::binding_for(
                    UQL0200,
                    format!(
                        "Property '{navigation_name}' is not declared on type '{}'",
                        current_type.qualified_name()
                    ),
                    (*navigation_name).to_owned(),
                    current_type.qualified_name(),
                )
            })?;

        if !property.is_navigation() {
            // Historical servers accepted expands of plain structural
            // properties and ignored them; streams are exempt from the shim
            if self.settings.server_compatibility_property_dropping && !property.is_stream() {
                return Ok(None);
            }
            return Err(UriqlError::binding_for(
                UQL0201,
                format!(
                    "Property '{navigation_name}' on type '{}' is not a navigation property",
                    current_type.qualified_name()
                ),
                (*navigation_name).to_owned(),
                current_type.qualified_name(),
            ));
        }

        if self.settings.use_legacy_grammar && has_per_term_options(term) {
            return Err(UriqlError::binding(
                UQL0207,
                format!(
                    "Expand term '{navigation_name}' carries per-term options, which the legacy grammar does not support"
                ),
            ));
        }

        let PropertyKind::Navigation { target_type, .. } = &property.kind else {
            unreachable!("is_navigation checked above");
        };
        let target_type = self.model.entity_type(target_type).ok_or_else(|| {
            UriqlError::binding(UQL0204, format!("Unknown type '{target_type}'"))
        })?;
        let target_set = self
            .entity_set
            .as_deref()
            .and_then(|set| self.model.find_navigation_target(set, navigation_name));

        // Nested filter/orderby bind in a fresh scope over the target
        let range_variable = RangeVariable::implicit(target_type.clone(), target_set.clone());
        let expression_binder = ExpressionBinder::new(self.model, range_variable);
        let filter = term
            .filter
            .as_ref()
            .map(|expr| expression_binder.bind_filter(expr))
            .transpose()?;
        let order_by = term
            .order_by
            .as_deref()
            .map(|items| expression_binder.bind_order_by(items))
            .transpose()?;

        // One sub-binder per depth, scoped to the target context
        let sub_binder = ExpandBinder::new(
            self.model,
            target_type.clone(),
            target_set.clone(),
            self.settings,
        );
        let mut sub_clause = match &term.expand {
            Some(nested) => sub_binder.bind(nested)?,
            None => SelectExpandClause::default(),
        };
        if let Some(select) = &term.select {
            SelectBinder::new(self.model, target_type.clone())
                .decorate(&mut sub_clause, select)?;
        }

        Ok(Some(ExpandedNavigationItem {
            path_to_navigation: identifiers.iter().map(|s| (*s).to_owned()).collect(),
            navigation: property,
            target_type,
            target_set,
            filter,
            order_by,
            top: term.top,
            skip: term.skip,
            count: term.count,
            select_and_expand: sub_clause,
        }))
    }
}

fn has_per_term_options(term: &ExpandTermToken) -> bool {
    term.filter.is_some()
        || term.order_by.is_some()
        || term.top.is_some()
        || term.skip.is_some()
        || term.count.is_some()
        || term.select.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Selection;
    use pretty_assertions::assert_eq;
    use uriql_ast::GrammarMode;
    use uriql_model::{EntityTypeBuilder, Multiplicity, PrimitiveKind};
    use uriql_parser::{parse_expand, ExpandTreeNormalizer};

    fn model() -> EdmModel {
        EdmModel::builder()
            .entity_type(
                EntityTypeBuilder::new("Ns", "Customer")
                    .structural("Name", PrimitiveKind::String)
                    .stream("Photo")
                    .navigation("Orders", "Ns.Order", Multiplicity::Many)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "PreferredCustomer")
                    .base_type("Ns.Customer")
                    .navigation("Coupons", "Ns.Coupon", Multiplicity::Many)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Order")
                    .structural("Amount", PrimitiveKind::Decimal)
                    .navigation("Items", "Ns.Item", Multiplicity::Many)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Item")
                    .structural("Sku", PrimitiveKind::String)
                    .build(),
            )
            .entity_type(EntityTypeBuilder::new("Ns", "Coupon").build())
            .entity_set(
                EntitySet::new("Customers", "Ns.Customer")
                    .with_navigation_target("Orders", "Orders"),
            )
            .entity_set(
                EntitySet::new("Orders", "Ns.Order").with_navigation_target("Items", "Items"),
            )
            .entity_set(EntitySet::new("Items", "Ns.Item"))
            .build()
    }

    fn bind(clause: &str, settings: &BindingSettings) -> Result<SelectExpandClause> {
        let model = model();
        let parsed = parse_expand(clause, 100, settings.grammar_mode()).unwrap();
        let normalized = ExpandTreeNormalizer::new().normalize_expand_tree(parsed);
        let binder = ExpandBinder::new(
            &model,
            model.entity_type("Ns.Customer").unwrap(),
            model.entity_set("Customers"),
            settings,
        );
        binder.bind(&normalized)
    }

    #[test]
    fn test_bind_simple_expand() {
        let clause = bind("Orders", &BindingSettings::default()).unwrap();
        assert_eq!(clause.expansion.len(), 1);
        let item = &clause.expansion[0];
        assert_eq!(item.navigation_name(), "Orders");
        assert_eq!(item.target_set.as_ref().unwrap().name, "Orders");
        assert_eq!(item.target_type.name, "Order");
        // Selection stays undecided until the finisher runs
        assert_eq!(clause.selection, Selection::Unknown);
    }

    #[test]
    fn test_bind_expand_with_options() {
        let clause = bind(
            "Orders($filter=Amount gt 10;$top=5;$count=true)",
            &BindingSettings::default(),
        )
        .unwrap();
        let item = &clause.expansion[0];
        assert!(item.filter.is_some());
        assert_eq!(item.top, Some(5));
        assert_eq!(item.count, Some(true));
        let filter = item.filter.as_ref().unwrap();
        assert_eq!(filter.range_variable.entity_type.name, "Order");
        assert_eq!(filter.range_variable.entity_set.as_ref().unwrap().name, "Orders");
    }

    #[test]
    fn test_bind_nested_levels_resolve_sets_along_the_chain() {
        let clause = bind("Orders/Items", &BindingSettings::default()).unwrap();
        let orders = &clause.expansion[0];
        let items = &orders.select_and_expand.expansion[0];
        assert_eq!(items.navigation_name(), "Items");
        assert_eq!(items.target_set.as_ref().unwrap().name, "Items");
    }

    #[test]
    fn test_property_not_declared() {
        let err = bind("Nothing", &BindingSettings::default()).unwrap_err();
        assert_eq!(err.code(), UQL0200);
        match err {
            UriqlError::Binding { identifier, type_name, .. } => {
                assert_eq!(identifier.as_deref(), Some("Nothing"));
                assert_eq!(type_name.as_deref(), Some("Ns.Customer"));
            }
            _ => panic!("Expected Binding"),
        }
    }

    #[test]
    fn test_structural_property_rejected() {
        let err = bind("Name", &BindingSettings::default()).unwrap_err();
        assert_eq!(err.code(), UQL0201);
    }

    #[test]
    fn test_compatibility_dropping() {
        let settings =
            BindingSettings::default().with_server_compatibility_property_dropping(true);

        // Structural property silently dropped, not an error
        let clause = bind("Name,Orders", &settings).unwrap();
        assert_eq!(clause.expansion.len(), 1);
        assert_eq!(clause.expansion[0].navigation_name(), "Orders");

        // Streams are exempt from the shim and still fail
        let err = bind("Photo", &settings).unwrap_err();
        assert_eq!(err.code(), UQL0201);
    }

    #[test]
    fn test_cast_segment_resolves_derived_navigation() {
        let clause = bind("Ns.PreferredCustomer/Coupons", &BindingSettings::default()).unwrap();
        let item = &clause.expansion[0];
        assert_eq!(item.navigation_name(), "Coupons");
        assert_eq!(
            item.path_to_navigation,
            vec!["Ns.PreferredCustomer", "Coupons"]
        );
        // No navigation target registered through the cast
        assert!(item.target_set.is_none());
    }

    #[test]
    fn test_cast_to_unrelated_type() {
        let err = bind("Ns.Item/Sku", &BindingSettings::default()).unwrap_err();
        assert_eq!(err.code(), UQL0203);
    }

    #[test]
    fn test_cast_to_unknown_type() {
        let err = bind("Ns.Ghost/Orders", &BindingSettings::default()).unwrap_err();
        assert_eq!(err.code(), UQL0204);
    }

    #[test]
    fn test_non_normalized_tree_is_an_invariant_violation() {
        let model = model();
        let settings = BindingSettings::default();
        // Hand the binder a parsed-but-unnormalized multi-segment path
        let parsed = parse_expand("Orders/Items", 100, GrammarMode::Current).unwrap();
        let binder = ExpandBinder::new(
            &model,
            model.entity_type("Ns.Customer").unwrap(),
            model.entity_set("Customers"),
            &settings,
        );
        let err = binder.bind(&parsed).unwrap_err();
        assert_eq!(err.code(), UQL0202);
    }

    #[test]
    fn test_legacy_mode_rejects_options() {
        // Legacy parsing would reject the syntax outright; drive the binder
        // directly with a current-grammar tree under legacy settings
        let model = model();
        let settings = BindingSettings::default().with_legacy_grammar(true);
        let parsed = parse_expand("Orders($top=3)", 100, GrammarMode::Current).unwrap();
        let normalized = ExpandTreeNormalizer::new().normalize_expand_tree(parsed);
        let binder = ExpandBinder::new(
            &model,
            model.entity_type("Ns.Customer").unwrap(),
            model.entity_set("Customers"),
            &settings,
        );
        let err = binder.bind(&normalized).unwrap_err();
        assert_eq!(err.code(), UQL0207);
    }

    #[test]
    fn test_legacy_mode_binds_split_paths() {
        let settings = BindingSettings::default().with_legacy_grammar(true);
        let clause = bind("Orders/Items", &settings).unwrap();
        let orders = &clause.expansion[0];
        assert_eq!(orders.select_and_expand.expansion.len(), 1);
    }
}
