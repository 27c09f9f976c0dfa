//! The contextual attributes an application attaches to parameters.
//!
//! Each attribute is a small immutable value. None of them cache: every
//! resolution asks the underlying subsystem again.
//!
//! ```rust,ignore
//! let handler = Callable::new(|args: &Arguments| {
//!     let logger = args.shared::<FileLogger>("logger")?;
//!     let id: u64 = args.value("id")?;
//!     Ok(format!("{} {id}", logger.channel()))
//! })
//! .param(Param::untyped("logger").attribute(Log::key("audit")))
//! .param(Param::untyped("id").attribute(RouteArgument::new("id")));
//! ```

mod config;
mod current_user;
mod named;
mod route_argument;

pub use config::Config;
pub use current_user::CurrentUser;
pub use named::{Cache, Db, Encryption, Log, Mail, Orm};
pub use route_argument::RouteArgument;

use engine_container::{ContainerError, Resolved, Resolver, ResolverExt, Result};
use tracing::trace;

use crate::services::{RegistryHandle, Subsystem};

/// Loads `key` (or the registry's default) from a subsystem registry.
fn load_named(resolver: &dyn Resolver, subsystem: Subsystem, key: Option<&str>) -> Result<Resolved> {
    let registry: RegistryHandle = resolver.resolve_named(subsystem.name())?;
    let key = key.unwrap_or_else(|| registry.default_key());

    trace!(%subsystem, key, "Loading named service");
    registry.load(key).map(Resolved::Shared).map_err(ContainerError::Service)
}

/// Rejects blank keys.
fn require_key(what: &str, key: &str) -> std::result::Result<(), String> {
    if key.trim().is_empty() {
        return Err(format!("{what} must not be blank"));
    }
    Ok(())
}
