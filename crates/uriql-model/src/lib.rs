//! Entity data model abstraction for uriql
//!
//! This crate provides the read-only metadata the semantic binder resolves
//! identifiers against: entity types with structural and navigation
//! properties, entity sets with navigation targets, and the model registry
//! with its resolution queries. Models are built once through the fluent
//! builders and shared via `Arc`; nothing here is mutated after build.

mod model;
mod types;

pub use model::*;
pub use types::*;
