//! Entity type and property definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive value kinds for structural properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Guid,
    Int16,
    Int32,
    Int64,
    Single,
    /// Named stream payload; exempt from the server-compatibility
    /// expand-dropping shim
    Stream,
    String,
    TimeOfDay,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edm.{:?}", self)
    }
}

/// Multiplicity of a navigation property target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    /// Exactly one related entity
    One,
    /// Zero or one related entity
    ZeroOrOne,
    /// A collection of related entities
    Many,
}

impl Multiplicity {
    /// Whether this multiplicity yields a collection
    pub const fn is_collection(&self) -> bool {
        matches!(self, Multiplicity::Many)
    }
}

/// The payload of a declared property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Structural property holding a primitive value
    Structural {
        /// The primitive value kind
        value_kind: PrimitiveKind,
    },
    /// Navigation property linking to another entity type
    Navigation {
        /// Qualified name of the target entity type
        target_type: String,
        /// Target multiplicity
        multiplicity: Multiplicity,
    },
}

/// A property declared on an entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Structural or navigation payload
    pub kind: PropertyKind,
}

impl Property {
    /// Create a structural property
    pub fn structural(name: impl Into<String>, value_kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Structural { value_kind },
        }
    }

    /// Create a navigation property
    pub fn navigation(
        name: impl Into<String>,
        target_type: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Navigation {
                target_type: target_type.into(),
                multiplicity,
            },
        }
    }

    /// Whether this is a navigation property
    pub const fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation { .. })
    }

    /// Whether this is a stream-valued structural property
    pub const fn is_stream(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Structural {
                value_kind: PrimitiveKind::Stream
            }
        )
    }

    /// The primitive value kind, for structural properties
    pub fn value_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            PropertyKind::Structural { value_kind } => Some(value_kind),
            PropertyKind::Navigation { .. } => None,
        }
    }
}

/// An entity type: a named bag of declared properties with an optional base
/// type
///
/// Declaration order of properties is preserved; resolution through the base
/// chain is handled by [`crate::EdmModel::resolve_property`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    /// Namespace (e.g. "Ns")
    pub namespace: String,
    /// Unqualified type name (e.g. "Customer")
    pub name: String,
    /// Qualified name of the base type, if any
    pub base_type: Option<String>,
    /// Declared properties, in declaration order
    pub properties: IndexMap<String, Property>,
}

impl EntityType {
    /// The namespace-qualified type name (e.g. "Ns.Customer")
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Look up a property declared directly on this type (base types are not
    /// consulted)
    pub fn declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }
}

/// Fluent builder for [`EntityType`]
#[derive(Debug)]
pub struct EntityTypeBuilder {
    namespace: String,
    name: String,
    base_type: Option<String>,
    properties: IndexMap<String, Property>,
}

impl EntityTypeBuilder {
    /// Start a new entity type
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            base_type: None,
            properties: IndexMap::new(),
        }
    }

    /// Derive from a base type (qualified name)
    pub fn base_type(mut self, qualified_name: impl Into<String>) -> Self {
        self.base_type = Some(qualified_name.into());
        self
    }

    /// Declare a structural property
    pub fn structural(mut self, name: impl Into<String>, value_kind: PrimitiveKind) -> Self {
        let prop = Property::structural(name, value_kind);
        self.properties.insert(prop.name.clone(), prop);
        self
    }

    /// Declare a stream-valued structural property
    pub fn stream(self, name: impl Into<String>) -> Self {
        self.structural(name, PrimitiveKind::Stream)
    }

    /// Declare a navigation property
    pub fn navigation(
        mut self,
        name: impl Into<String>,
        target_type: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Self {
        let prop = Property::navigation(name, target_type, multiplicity);
        self.properties.insert(prop.name.clone(), prop);
        self
    }

    /// Finish the type
    pub fn build(self) -> EntityType {
        EntityType {
            namespace: self.namespace,
            name: self.name,
            base_type: self.base_type,
            properties: self.properties,
        }
    }
}

/// An entity set: a named collection of entities of one element type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    /// Set name (e.g. "Customers")
    pub name: String,
    /// Qualified name of the element entity type
    pub element_type: String,
    /// Navigation targets: navigation property name to entity set name
    pub navigation_targets: IndexMap<String, String>,
}

impl EntitySet {
    /// Create a new entity set
    pub fn new(name: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: element_type.into(),
            navigation_targets: IndexMap::new(),
        }
    }

    /// Register a navigation target
    pub fn with_navigation_target(
        mut self,
        navigation_property: impl Into<String>,
        target_set: impl Into<String>,
    ) -> Self {
        self.navigation_targets
            .insert(navigation_property.into(), target_set.into());
        self
    }
}
