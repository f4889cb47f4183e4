//! uriql: query-expression parser and semantic binder for REST-style
//! resource queries
//!
//! Turns raw `$select`/`$expand` clause text into a validated,
//! metadata-bound [`SelectExpandClause`] through a fixed pipeline:
//! lexer, syntactic parser (legacy or current grammar), expand tree
//! normalizer, semantic binder, tree finisher and depth/count validator.
//!
//! # Example
//!
//! ```
//! use uriql::{BindingSettings, SelectExpandPipeline};
//! use uriql::model::{EdmModel, EntitySet, EntityTypeBuilder, Multiplicity, PrimitiveKind};
//!
//! let model = EdmModel::builder()
//!     .entity_type(
//!         EntityTypeBuilder::new("Shop", "Customer")
//!             .structural("Name", PrimitiveKind::String)
//!             .navigation("Orders", "Shop.Order", Multiplicity::Many)
//!             .build(),
//!     )
//!     .entity_type(
//!         EntityTypeBuilder::new("Shop", "Order")
//!             .structural("Amount", PrimitiveKind::Decimal)
//!             .build(),
//!     )
//!     .entity_set(
//!         EntitySet::new("Customers", "Shop.Customer")
//!             .with_navigation_target("Orders", "Orders"),
//!     )
//!     .entity_set(EntitySet::new("Orders", "Shop.Order"))
//!     .build();
//!
//! let customer = model.entity_type("Shop.Customer").unwrap();
//! let pipeline = SelectExpandPipeline::new(&model, customer, model.entity_set("Customers"))
//!     .with_settings(BindingSettings::default());
//! let clause = pipeline
//!     .run(Some("Name"), Some("Orders($filter=Amount gt 10;$top=5)"))
//!     .unwrap();
//! assert_eq!(clause.expansion.len(), 1);
//! ```

// Re-export the pipeline crates under stable module names
pub use uriql_ast as ast;
pub use uriql_diagnostics as diagnostics;
pub use uriql_model as model;
pub use uriql_parser as parser;
pub use uriql_semantic as semantic;

// Convenience re-exports
pub use uriql_ast::{ExpandToken, GrammarMode, SelectToken};
pub use uriql_diagnostics::{Result, UriqlError};
pub use uriql_model::EdmModel;
pub use uriql_parser::{parse_expand, parse_select, ExpandTreeNormalizer};
pub use uriql_semantic::{BindingSettings, SelectExpandClause, Selection};

mod pipeline;

pub use pipeline::{bind, SelectExpandPipeline};
