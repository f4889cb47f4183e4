//! Model registry and resolution queries

use crate::{EntitySet, EntityType, Property};
use indexmap::IndexMap;
use std::sync::Arc;

/// The entity data model: type and set registries plus the resolution
/// queries the binder consumes
///
/// All lookups hand out `Arc` clones; the model itself is never written
/// after [`EdmModelBuilder::build`], so it can be shared freely across
/// concurrent parses.
#[derive(Debug, Clone, Default)]
pub struct EdmModel {
    types: IndexMap<String, Arc<EntityType>>,
    sets: IndexMap<String, Arc<EntitySet>>,
}

impl EdmModel {
    /// Start building a model
    pub fn builder() -> EdmModelBuilder {
        EdmModelBuilder::default()
    }

    /// Look up an entity type by qualified name
    pub fn entity_type(&self, qualified_name: &str) -> Option<Arc<EntityType>> {
        self.types.get(qualified_name).cloned()
    }

    /// Look up an entity set by name
    pub fn entity_set(&self, name: &str) -> Option<Arc<EntitySet>> {
        self.sets.get(name).cloned()
    }

    /// Resolve a property against a type, walking the base-type chain
    pub fn resolve_property(&self, entity_type: &EntityType, name: &str) -> Option<Property> {
        if let Some(prop) = entity_type.declared_property(name) {
            return Some(prop.clone());
        }
        let mut base = entity_type.base_type.clone();
        while let Some(base_name) = base {
            let base_type = self.types.get(&base_name)?;
            if let Some(prop) = base_type.declared_property(name) {
                return Some(prop.clone());
            }
            base = base_type.base_type.clone();
        }
        None
    }

    /// The entity set an expansion of `navigation_property` lands in, when
    /// the source set declares a target for it
    pub fn find_navigation_target(
        &self,
        source_set: &EntitySet,
        navigation_property: &str,
    ) -> Option<Arc<EntitySet>> {
        let target = source_set.navigation_targets.get(navigation_property)?;
        self.entity_set(target)
    }

    /// The element type of an entity set
    pub fn element_type(&self, set: &EntitySet) -> Option<Arc<EntityType>> {
        self.entity_type(&set.element_type)
    }

    /// Whether `candidate` is `base` or derives from it
    pub fn is_assignable_from(&self, base: &str, candidate: &str) -> bool {
        if base == candidate {
            return true;
        }
        let mut current = self
            .types
            .get(candidate)
            .and_then(|t| t.base_type.clone());
        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.types.get(&name).and_then(|t| t.base_type.clone());
        }
        false
    }

    /// Whether two types are related by derivation in either direction
    pub fn are_related(&self, a: &str, b: &str) -> bool {
        self.is_assignable_from(a, b) || self.is_assignable_from(b, a)
    }
}

/// Fluent builder for [`EdmModel`]
#[derive(Debug, Default)]
pub struct EdmModelBuilder {
    types: IndexMap<String, Arc<EntityType>>,
    sets: IndexMap<String, Arc<EntitySet>>,
}

impl EdmModelBuilder {
    /// Register an entity type
    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.types
            .insert(entity_type.qualified_name(), Arc::new(entity_type));
        self
    }

    /// Register an entity set
    pub fn entity_set(mut self, set: EntitySet) -> Self {
        self.sets.insert(set.name.clone(), Arc::new(set));
        self
    }

    /// Finish the model
    pub fn build(self) -> EdmModel {
        EdmModel {
            types: self.types,
            sets: self.sets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityTypeBuilder, Multiplicity, PrimitiveKind};

    fn sample_model() -> EdmModel {
        EdmModel::builder()
            .entity_type(
                EntityTypeBuilder::new("Ns", "Person")
                    .structural("Name", PrimitiveKind::String)
                    .build(),
            )
            .entity_type(
                EntityTypeBuilder::new("Ns", "Employee")
                    .base_type("Ns.Person")
                    .structural("Salary", PrimitiveKind::Decimal)
                    .navigation("Manager", "Ns.Employee", Multiplicity::ZeroOrOne)
                    .build(),
            )
            .entity_set(
                EntitySet::new("People", "Ns.Person").with_navigation_target("Manager", "People"),
            )
            .build()
    }

    #[test]
    fn test_resolve_property_walks_base_chain() {
        let model = sample_model();
        let employee = model.entity_type("Ns.Employee").unwrap();

        let inherited = model.resolve_property(&employee, "Name").unwrap();
        assert_eq!(inherited.name, "Name");

        let own = model.resolve_property(&employee, "Salary").unwrap();
        assert!(!own.is_navigation());

        assert!(model.resolve_property(&employee, "Nothing").is_none());
    }

    #[test]
    fn test_assignability() {
        let model = sample_model();
        assert!(model.is_assignable_from("Ns.Person", "Ns.Employee"));
        assert!(!model.is_assignable_from("Ns.Employee", "Ns.Person"));
        assert!(model.is_assignable_from("Ns.Person", "Ns.Person"));
        assert!(model.are_related("Ns.Employee", "Ns.Person"));
    }

    #[test]
    fn test_navigation_target() {
        let model = sample_model();
        let people = model.entity_set("People").unwrap();
        let target = model.find_navigation_target(&people, "Manager").unwrap();
        assert_eq!(target.name, "People");
        assert!(model.find_navigation_target(&people, "Orders").is_none());
    }
}
