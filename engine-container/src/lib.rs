//! Service container for the Engine framework.
//!
//! Bindings, lifetimes, declared parameter signatures, contextual
//! attributes and the resolution engine.

pub mod attribute;
pub mod binding;
pub mod container;
pub mod error;
mod in_flight;
pub mod key;
pub mod lifetime;
pub mod provider;
pub mod resolution;
pub mod settings;
pub mod signature;

pub use attribute::{ContextualAttribute, Injectable};
pub use binding::Erased;
pub use container::{Container, prelude};
pub use error::{BoxError, ContainerError, Result};
pub use key::DependencyKey;
pub use lifetime::Lifetime;
pub use provider::Provider;
pub use resolution::{Resolver, ResolverExt};
pub use settings::ContainerSettings;
pub use signature::{Arguments, Callable, Overrides, Param, Resolved, Signature};
