//! One-stop select/expand pipeline
//!
//! Chains parse, normalize, bind, finish and validate. Each run is a pure
//! function of the clause text, the model and the settings; the pipeline
//! value itself holds no per-run state and can be reused across clauses.

use std::sync::Arc;
use uriql_ast::{ExpandToken, SelectToken};
use uriql_diagnostics::Result;
use uriql_model::{EdmModel, EntitySet, EntityType};
use uriql_parser::{parse_expand, parse_select, ExpandTreeNormalizer};
use uriql_semantic::{
    finish_select_expand_tree, BindingSettings, ExpandBinder, ExpandDepthAndCountValidator,
    SelectBinder, SelectExpandClause,
};

/// Bind already-parsed select/expand tokens against the model
///
/// Normalizes the expand tree, runs both binder passes, finishes the tree
/// and enforces the configured limits. This is the entry point for
/// callers that parsed the clauses themselves.
pub fn bind(
    model: &EdmModel,
    entity_type: Arc<EntityType>,
    entity_set: Option<Arc<EntitySet>>,
    expand: ExpandToken,
    select: Option<&SelectToken>,
    settings: &BindingSettings,
) -> Result<SelectExpandClause> {
    let mode = settings.grammar_mode();
    let normalized = ExpandTreeNormalizer::new().normalize_expand_tree(expand);

    let clause = ExpandBinder::new(model, entity_type.clone(), entity_set, settings)
        .bind(&normalized)?;
    let clause = SelectBinder::new(model, entity_type).bind(select, clause)?;
    let clause = finish_select_expand_tree(clause, mode);

    ExpandDepthAndCountValidator::new(
        settings.maximum_expansion_depth,
        settings.maximum_expansion_count,
    )
    .validate(&clause)?;
    Ok(clause)
}

/// Parses and binds select/expand clause text for one entity context
#[derive(Debug)]
pub struct SelectExpandPipeline<'m> {
    model: &'m EdmModel,
    entity_type: Arc<EntityType>,
    entity_set: Option<Arc<EntitySet>>,
    settings: BindingSettings,
}

impl<'m> SelectExpandPipeline<'m> {
    /// Create a pipeline for an entity type/set context with default
    /// settings
    pub fn new(
        model: &'m EdmModel,
        entity_type: Arc<EntityType>,
        entity_set: Option<Arc<EntitySet>>,
    ) -> Self {
        Self {
            model,
            entity_type,
            entity_set,
            settings: BindingSettings::default(),
        }
    }

    /// Replace the settings
    pub fn with_settings(mut self, settings: BindingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse, normalize, bind, finish and validate the given clauses
    ///
    /// `None` means the clause was absent from the request; an absent
    /// `$select` selects everything at the top level.
    pub fn run(
        &self,
        select: Option<&str>,
        expand: Option<&str>,
    ) -> Result<SelectExpandClause> {
        let mode = self.settings.grammar_mode();
        let limit = self.settings.select_expand_limit;

        let expand_token = match expand {
            Some(text) => parse_expand(text, limit, mode)?,
            None => ExpandToken::new(),
        };
        let select_token = match select {
            Some(text) => Some(parse_select(text, limit, mode)?),
            None => None,
        };

        bind(
            self.model,
            self.entity_type.clone(),
            self.entity_set.clone(),
            expand_token,
            select_token.as_ref(),
            &self.settings,
        )
    }
}
