//! Pipeline configuration

use uriql_ast::GrammarMode;

/// Configuration for parsing and binding select/expand clauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSettings {
    /// Parse and bind with the legacy non-option grammar
    pub use_legacy_grammar: bool,
    /// Maximum recursion depth of the syntactic parsers
    pub select_expand_limit: usize,
    /// Maximum nesting depth of the finished expansion tree
    pub maximum_expansion_depth: usize,
    /// Maximum total number of expanded items in the finished tree
    pub maximum_expansion_count: usize,
    /// Silently drop expand terms that name a non-stream structural
    /// property instead of failing, mirroring historical server behavior;
    /// stream properties are exempt and still fail
    pub server_compatibility_property_dropping: bool,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self {
            use_legacy_grammar: false,
            select_expand_limit: 800,
            maximum_expansion_depth: usize::MAX,
            maximum_expansion_count: usize::MAX,
            server_compatibility_property_dropping: false,
        }
    }
}

impl BindingSettings {
    /// Create settings with the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the legacy or current grammar
    pub fn with_legacy_grammar(mut self, legacy: bool) -> Self {
        self.use_legacy_grammar = legacy;
        self
    }

    /// Set the parser recursion limit
    pub fn with_select_expand_limit(mut self, limit: usize) -> Self {
        self.select_expand_limit = limit;
        self
    }

    /// Set the maximum expansion depth of the finished tree
    pub fn with_maximum_expansion_depth(mut self, depth: usize) -> Self {
        self.maximum_expansion_depth = depth;
        self
    }

    /// Set the maximum expansion item count of the finished tree
    pub fn with_maximum_expansion_count(mut self, count: usize) -> Self {
        self.maximum_expansion_count = count;
        self
    }

    /// Enable the server-compatibility property-dropping shim
    pub fn with_server_compatibility_property_dropping(mut self, enabled: bool) -> Self {
        self.server_compatibility_property_dropping = enabled;
        self
    }

    /// The grammar mode these settings select
    pub fn grammar_mode(&self) -> GrammarMode {
        if self.use_legacy_grammar {
            GrammarMode::Legacy
        } else {
            GrammarMode::Current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BindingSettings::default();
        assert_eq!(settings.grammar_mode(), GrammarMode::Current);
        assert_eq!(settings.select_expand_limit, 800);
        assert!(!settings.server_compatibility_property_dropping);
    }

    #[test]
    fn test_builders() {
        let settings = BindingSettings::new()
            .with_legacy_grammar(true)
            .with_maximum_expansion_depth(3)
            .with_maximum_expansion_count(10);
        assert_eq!(settings.grammar_mode(), GrammarMode::Legacy);
        assert_eq!(settings.maximum_expansion_depth, 3);
        assert_eq!(settings.maximum_expansion_count, 10);
    }
}
