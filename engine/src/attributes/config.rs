use std::sync::Arc;

use engine_container::{ContextualAttribute, Resolved, Resolver, ResolverExt, Result};

use super::require_key;
use crate::services::ConfigStore;

/// A configuration value by dotted key, such as `"app.name"`.
///
/// Resolves to `Null` when the key is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    key: String,
}

impl Config {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ContextualAttribute for Config {
    fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved> {
        let store: Arc<dyn ConfigStore> = resolver.resolve()?;
        Ok(Resolved::from_value(store.get(&self.key)))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        require_key("config key", &self.key)
    }
}
