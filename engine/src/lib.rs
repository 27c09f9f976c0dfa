//! # Engine
//!
//! Service container, contextual attributes and application bootstrap.
//!
//! ```rust,ignore
//! use engine::prelude::*;
//!
//! let engine = Engine::builder()
//!     .registry(Subsystem::Cache, CacheManager::default())
//!     .request(MatchedRoute::new("/posts/{id}").argument("id", "7"))
//!     .build()?;
//!
//! let show = Callable::new(|args: &Arguments| {
//!     let cache = args.shared::<RedisStore>("cache")?;
//!     let id: u64 = args.value("id")?;
//!     cache.remember(id)
//! })
//! .param(Param::untyped("cache").attribute(Cache::key("redis")))
//! .param(Param::untyped("id").attribute(RouteArgument::new("id")));
//!
//! engine.call(&show, Overrides::new())?;
//! ```

pub mod attributes;
pub mod engine;
pub mod error;
pub mod logging;
pub mod services;

pub use engine::{Engine, EngineBuilder, app};
pub use engine_container::*;
pub use engine_support::rendering;
pub use error::EngineError;

pub mod prelude {
    pub use crate::attributes::*;
    pub use crate::engine::{Engine, EngineBuilder, app};
    pub use crate::error::EngineError;
    pub use crate::services::{
        AuthService, ConfigStore, MatchedRoute, NamedRegistry, RegistryHandle, ServerRequest, Service, Subsystem,
    };
    pub use engine_container::prelude::*;
}
