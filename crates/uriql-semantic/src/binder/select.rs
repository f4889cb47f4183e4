//! Select binder
//!
//! Runs after expand binding, over the same clause: it annotates the
//! already-built expansion tree with selection flags rather than
//! rebuilding it. An absent or empty `$select` marks the level
//! all-selected; otherwise the level becomes a partial selection and each
//! path is validated against the model. Paths that traverse a navigation
//! property recurse into the matching expanded item.

use crate::{SelectExpandClause, SelectItem, Selection};
use std::sync::Arc;
use uriql_ast::{PathSegment, SelectToken};
use uriql_diagnostics::{Result, UriqlError, UQL0200, UQL0201, UQL0203, UQL0204, UQL0208};
use uriql_model::{EdmModel, EntityType};

/// Binds `$select` paths onto a bound expand clause
#[derive(Debug)]
pub struct SelectBinder<'m> {
    model: &'m EdmModel,
    entity_type: Arc<EntityType>,
}

impl<'m> SelectBinder<'m> {
    /// Create a binder scoped to the type being projected
    pub fn new(model: &'m EdmModel, entity_type: Arc<EntityType>) -> Self {
        Self { model, entity_type }
    }

    /// Bind a top-level `$select` onto the clause
    ///
    /// No select, or an empty one, selects everything at this level.
    pub fn bind(
        &self,
        select: Option<&SelectToken>,
        mut clause: SelectExpandClause,
    ) -> Result<SelectExpandClause> {
        match select {
            None => clause.selection = Selection::All,
            Some(token) => self.decorate(&mut clause, token)?,
        }
        Ok(clause)
    }

    /// Decorate a clause with an explicit select token (also used for
    /// nested `$select=` options)
    pub fn decorate(&self, clause: &mut SelectExpandClause, select: &SelectToken) -> Result<()> {
        if select.is_empty() {
            clause.selection = Selection::All;
            return Ok(());
        }
        ensure_partial(clause);
        for path in &select.items {
            self.bind_select_path(path, clause, self.entity_type.clone())?;
        }
        // A lone wildcard selects everything at this level
        if let Selection::Partial(items) = &clause.selection {
            if items.len() == 1 && items[0] == SelectItem::Wildcard {
                clause.selection = Selection::All;
            }
        }
        Ok(())
    }

    fn bind_select_path(
        &self,
        segment: &PathSegment,
        clause: &mut SelectExpandClause,
        current_type: Arc<EntityType>,
    ) -> Result<()> {
        // Wildcards are terminal (the parser rejects `*/...`)
        if segment.identifier == "*" || segment.identifier.ends_with(".*") {
            add_item(clause, SelectItem::Wildcard);
            return Ok(());
        }

        // A dotted segment is a type cast narrowing the rest of the path
        if segment.identifier.contains('.') {
            let cast = &segment.identifier;
            let cast_type = self
                .model
                .entity_type(cast)
                .ok_or_else(|| UriqlError::binding(UQL0204, format!("Unknown type '{cast}'")))?;
            if !self.model.are_related(&current_type.qualified_name(), cast) {
                return Err(UriqlError::binding(
                    UQL0203,
                    format!(
                        "Type '{cast}' is not related to type '{}'",
                        current_type.qualified_name()
                    ),
                ));
            }
            return match segment.next.as_deref() {
                Some(next) => self.bind_select_path(next, clause, cast_type),
                // A bare cast selects nothing further; treat as the
                // wildcard over the narrowed type
                None => {
                    add_item(clause, SelectItem::Wildcard);
                    Ok(())
                }
            };
        }

        let name = &segment.identifier;
        let property = self
            .model
            .resolve_property(&current_type, name)
            .ok_or_else(|| {
                UriqlError::binding_for(
                    UQL0200,
                    format!(
                        "Property '{name}' is not declared on type '{}'",
                        current_type.qualified_name()
                    ),
                    name.clone(),
                    current_type.qualified_name(),
                )
            })?;

        let Some(next) = segment.next.as_deref() else {
            // Terminal segment: select the property itself (structural
            // value or navigation reference)
            add_item(clause, SelectItem::Property(name.clone()));
            return Ok(());
        };

        // The path continues, so this segment must traverse an expanded
        // navigation property
        if !property.is_navigation() {
            return Err(UriqlError::binding_for(
                UQL0201,
                format!(
                    "Property '{name}' on type '{}' is not a navigation property and cannot be traversed in a select path",
                    current_type.qualified_name()
                ),
                name.clone(),
                current_type.qualified_name(),
            ));
        }
        let Some(item) = clause
            .expansion
            .iter_mut()
            .find(|item| item.navigation_name() == name)
        else {
            return Err(UriqlError::binding_for(
                UQL0208,
                format!("Select path traverses navigation property '{name}', which is not expanded"),
                name.clone(),
                current_type.qualified_name(),
            ));
        };
        let target_type = item.target_type.clone();
        ensure_partial(&mut item.select_and_expand);
        self.bind_select_path(next, &mut item.select_and_expand, target_type)
    }
}

/// Upgrade an undecided selection to an empty partial one; an explicit
/// `All` stays all-selected
fn ensure_partial(clause: &mut SelectExpandClause) {
    if matches!(clause.selection, Selection::Unknown) {
        clause.selection = Selection::Partial(Vec::new());
    }
}

/// Add an item to a partial selection, collapsing duplicates
fn add_item(clause: &mut SelectExpandClause, item: SelectItem) {
    ensure_partial(clause);
    if let Selection::Partial(items) = &mut clause.selection {
        if !items.contains(&item) {
            items.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BindingSettings, ExpandBinder};
    use pretty_assertions::assert_eq;
    use uriql_ast::GrammarMode;
    use uriql_model::{EntitySet, EntityTypeBuilder, Multiplicity, PrimitiveKind};
    use uriql_parser::{parse_expand, parse_select, ExpandTreeNormalizer};

    fn model() -> EdmModel {
        EdmModel::builder()
            .entity_type(
                EntityTypeBuilder::new("Ns", "Customer")
                    .structural("Name", PrimitiveKind::String)
                    .structural("City", PrimitiveKind::String)
                    .navigation("Orders", "Ns.Order", Multiplicity::Many)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Order")
                    .structural("Amount", PrimitiveKind::Decimal)
                    .build(),
            )
            .entity_set(
                EntitySet::new("Customers", "Ns.Customer")
                    .with_navigation_target("Orders", "Orders"),
            )
            .entity_set(EntitySet::new("Orders", "Ns.Order"))
            .build()
    }

    fn bind(
        select: Option<&str>,
        expand: &str,
        model: &EdmModel,
    ) -> Result<SelectExpandClause> {
        let settings = BindingSettings::default();
        let parsed = parse_expand(expand, 100, GrammarMode::Current).unwrap();
        let normalized = ExpandTreeNormalizer::new().normalize_expand_tree(parsed);
        let customer = model.entity_type("Ns.Customer").unwrap();
        let clause = ExpandBinder::new(
            model,
            customer.clone(),
            model.entity_set("Customers"),
            &settings,
        )
        .bind(&normalized)?;
        let select_token = select
            .map(|text| parse_select(text, 100, GrammarMode::Current).unwrap());
        SelectBinder::new(model, customer).bind(select_token.as_ref(), clause)
    }

    #[test]
    fn test_no_select_marks_all() {
        let model = model();
        let clause = bind(None, "Orders", &model).unwrap();
        assert_eq!(clause.selection, Selection::All);
    }

    #[test]
    fn test_empty_select_marks_all() {
        let model = model();
        let clause = bind(Some(""), "", &model).unwrap();
        assert_eq!(clause.selection, Selection::All);
    }

    #[test]
    fn test_named_properties() {
        let model = model();
        let clause = bind(Some("Name,City"), "", &model).unwrap();
        assert_eq!(
            clause.selection,
            Selection::Partial(vec![
                SelectItem::Property("Name".into()),
                SelectItem::Property("City".into()),
            ])
        );
    }

    #[test]
    fn test_duplicate_select_collapses_at_bind_time() {
        let model = model();
        let clause = bind(Some("Name,Name"), "", &model).unwrap();
        assert_eq!(
            clause.selection,
            Selection::Partial(vec![SelectItem::Property("Name".into())])
        );
    }

    #[test]
    fn test_lone_wildcard_selects_all() {
        let model = model();
        let clause = bind(Some("*"), "", &model).unwrap();
        assert_eq!(clause.selection, Selection::All);
    }

    #[test]
    fn test_wildcard_alongside_names_stays_partial() {
        let model = model();
        let clause = bind(Some("Name,*"), "", &model).unwrap();
        assert_eq!(
            clause.selection,
            Selection::Partial(vec![
                SelectItem::Property("Name".into()),
                SelectItem::Wildcard,
            ])
        );
    }

    #[test]
    fn test_undeclared_property_names_type_and_identifier() {
        let model = model();
        let err = bind(Some("DoesNotExist"), "", &model).unwrap_err();
        assert_eq!(err.code(), UQL0200);
        match err {
            UriqlError::Binding { identifier, type_name, .. } => {
                assert_eq!(identifier.as_deref(), Some("DoesNotExist"));
                assert_eq!(type_name.as_deref(), Some("Ns.Customer"));
            }
            _ => panic!("Expected Binding"),
        }
    }

    #[test]
    fn test_select_path_annotates_expanded_item() {
        let model = model();
        let clause = bind(Some("Orders/Amount"), "Orders", &model).unwrap();
        let orders = &clause.expansion[0];
        assert_eq!(
            orders.select_and_expand.selection,
            Selection::Partial(vec![SelectItem::Property("Amount".into())])
        );
    }

    #[test]
    fn test_select_path_through_unexpanded_navigation_fails() {
        let model = model();
        let err = bind(Some("Orders/Amount"), "", &model).unwrap_err();
        assert_eq!(err.code(), UQL0208);
    }

    #[test]
    fn test_select_path_through_structural_property_fails() {
        let model = model();
        let err = bind(Some("Name/Nope"), "", &model).unwrap_err();
        assert_eq!(err.code(), UQL0201);
    }

    #[test]
    fn test_selecting_navigation_reference_is_allowed() {
        let model = model();
        let clause = bind(Some("Orders"), "", &model).unwrap();
        assert!(clause.selection.selects_property("Orders"));
    }
}
