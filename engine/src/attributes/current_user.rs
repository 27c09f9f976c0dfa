use std::sync::Arc;

use engine_container::{ContextualAttribute, Resolved, Resolver, ResolverExt, Result};

use crate::services::AuthService;

/// The authenticated user, or `Null` for a guest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrentUser;

impl ContextualAttribute for CurrentUser {
    fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved> {
        let auth: Arc<dyn AuthService> = resolver.resolve()?;
        Ok(auth.user().map_or(Resolved::Null, Resolved::Shared))
    }
}
