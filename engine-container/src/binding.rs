//! The binding table: how each identifier is produced.
//!
//! The table maps [`DependencyKey`] to a [`Binding`]. A binding pairs a
//! [`Producer`] with a [`Lifetime`]; shared bindings own the once-cell their
//! instance is memoised in.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{AlreadyBoundError, ContainerError, Result};
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::resolution::Resolver;
use crate::signature::Overrides;

/// A type-erased value held by the container.
///
/// The box always holds a value of the binding's own type `T`; typed reads
/// clone it back out.
pub type Erased = Arc<dyn Any + Send + Sync>;

/// Factory closure bound with `bind`/`singleton`.
///
/// `Arc` rather than `Box`: bindings are cloned out of the table before they
/// run so no table lock is held while a factory recurses into the container.
pub type FactoryFn = Arc<dyn Fn(&dyn Resolver) -> Result<Erased> + Send + Sync>;

/// Auto-construction entry point of an injectable type.
pub type ConstructFn = fn(&dyn Resolver, Overrides) -> Result<Erased>;

/// How a binding produces its value.
#[derive(Clone)]
pub(crate) enum Producer {
    /// A closure receiving the resolver.
    Factory(FactoryFn),
    /// An injectable type, built from its declared signature.
    Injectable(ConstructFn),
    /// A value registered with `instance()`; nothing to run.
    Prebuilt,
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Producer::Factory(_) => write!(f, "Factory"),
            Producer::Injectable(_) => write!(f, "Injectable"),
            Producer::Prebuilt => write!(f, "Prebuilt"),
        }
    }
}

/// Binding entry for a single identifier.
#[derive(Clone)]
pub(crate) struct Binding {
    pub key: DependencyKey,
    pub lifetime: Lifetime,
    pub producer: Producer,
    pub instance: Arc<OnceCell<Erased>>,
}

impl Binding {
    pub fn factory(key: DependencyKey, lifetime: Lifetime, factory: FactoryFn) -> Self {
        Self {
            key,
            lifetime,
            producer: Producer::Factory(factory),
            instance: Arc::new(OnceCell::new()),
        }
    }

    pub fn injectable(key: DependencyKey, lifetime: Lifetime, construct: ConstructFn) -> Self {
        Self {
            key,
            lifetime,
            producer: Producer::Injectable(construct),
            instance: Arc::new(OnceCell::new()),
        }
    }

    pub fn prebuilt(key: DependencyKey, value: Erased) -> Self {
        Self {
            key,
            lifetime: Lifetime::Singleton,
            producer: Producer::Prebuilt,
            instance: Arc::new(OnceCell::with_value(value)),
        }
    }

    /// The memoised instance, if this binding is shared and already built.
    pub fn cached(&self) -> Option<&Erased> {
        self.instance.get()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("producer", &self.producer)
            .field("built", &self.instance.get().is_some())
            .finish()
    }
}

/// Stores every binding of a container.
///
/// Written during bootstrap, read for the rest of the process. Lookups clone
/// the binding out so the shard lock is released before anything runs.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    bindings: DashMap<DependencyKey, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding.
    ///
    /// # Errors
    /// Returns [`ContainerError::AlreadyBound`] if the key is bound and
    /// `allow_override` is false.
    pub fn insert(&self, binding: Binding, allow_override: bool) -> Result<()> {
        match self.bindings.entry(binding.key.clone()) {
            Entry::Occupied(mut existing) => {
                if !allow_override {
                    return Err(ContainerError::AlreadyBound(AlreadyBoundError {
                        key: binding.key,
                    }));
                }
                warn!(key = %binding.key, lifetime = %binding.lifetime, "Replacing existing binding");
                existing.insert(binding);
            }
            Entry::Vacant(slot) => {
                debug!(key = %binding.key, lifetime = %binding.lifetime, "Bound dependency");
                slot.insert(binding);
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &DependencyKey) -> Option<Binding> {
        self.bindings.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn keys(&self) -> Vec<DependencyKey> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }
}
