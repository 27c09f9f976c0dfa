use std::sync::Arc;

use engine_container::{ContextualAttribute, Resolved, Resolver, ResolverExt, Result};

use super::require_key;
use crate::services::ServerRequest;

/// An argument captured by the matched route.
///
/// Resolves to `Null` when the route has no such argument. Values are
/// strings as matched; `Arguments::value` converts `"1"` to `1` when the
/// parameter is read as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteArgument {
    name: String,
}

impl RouteArgument {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ContextualAttribute for RouteArgument {
    fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved> {
        let request: Arc<dyn ServerRequest> = resolver.resolve()?;
        Ok(Resolved::from_value(request.route_argument(&self.name)))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        require_key("route argument name", &self.name)
    }
}
