//! # The Container
//!
//! Holds bindings and resolves identifiers or whole callables to values,
//! constructing dependencies on the way.
//!
//! # Architecture
//! ```text
//! bind / singleton / instance ──> BindingTable
//!                                     │
//!          resolve / build / call ────┤  one Resolution per request
//!                                     ▼
//!     override → contextual attribute → declared type → default
//! ```
//!
//! # Examples
//! ```rust
//! use engine_container::prelude::*;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn channel(&self) -> &str;
//! }
//!
//! struct FileLogger(String);
//! impl Logger for FileLogger {
//!     fn channel(&self) -> &str { &self.0 }
//! }
//!
//! let container = Container::new();
//! container.singleton::<Arc<dyn Logger>>(|_| Ok(Arc::new(FileLogger("app".into())) as Arc<dyn Logger>));
//!
//! let a: Arc<dyn Logger> = container.resolve().unwrap();
//! let b: Arc<dyn Logger> = container.resolve().unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(a.channel(), "app");
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::attribute::{Injectable, construct_erased};
use crate::binding::{Binding, BindingTable, Erased, Producer};
use crate::error::Result;
use crate::in_flight::InFlight;
use crate::key::DependencyKey;
use crate::lifetime::Lifetime;
use crate::provider::Provider;
use crate::resolution::{Resolution, Resolver, downcast};
use crate::settings::ContainerSettings;
use crate::signature::{Callable, Overrides};

/// The service container.
///
/// Registration methods take `&self` and return `&Self` so bootstrap code
/// can chain them; the binding table is safe to share between threads.
pub struct Container {
    bindings: BindingTable,
    settings: ContainerSettings,
    in_flight: InFlight,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            bindings: BindingTable::new(),
            settings,
            in_flight: InFlight::default(),
        }
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Registration ──

    /// Binds a factory for `T`.
    ///
    /// With `shared` the first produced value is kept for the container's
    /// life; otherwise the factory runs on every resolve.
    pub fn bind<T: Clone + Send + Sync + 'static>(
        &self,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
        shared: bool,
    ) -> &Self {
        self.bind_key(DependencyKey::of::<T>(), factory, shared)
    }

    /// Binds a factory for `T` under a binding name.
    pub fn bind_named<T: Clone + Send + Sync + 'static>(
        &self,
        name: &'static str,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
        shared: bool,
    ) -> &Self {
        self.bind_key(DependencyKey::named::<T>(name), factory, shared)
    }

    /// Binds a shared factory for `T`.
    pub fn singleton<T: Clone + Send + Sync + 'static>(
        &self,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
    ) -> &Self {
        self.bind(factory, true)
    }

    /// Binds `Arc<S>` to auto-construction of `S`.
    pub fn bind_injectable<S: Injectable>(&self, shared: bool) -> &Self {
        self.insert(Binding::injectable(
            DependencyKey::of::<Arc<S>>(),
            Lifetime::from_shared(shared),
            construct_erased::<S>,
        ))
    }

    pub fn singleton_injectable<S: Injectable>(&self) -> &Self {
        self.bind_injectable::<S>(true)
    }

    /// Registers a pre-built shared value for `T`.
    pub fn instance<T: Clone + Send + Sync + 'static>(&self, value: T) -> &Self {
        self.insert(Binding::prebuilt(DependencyKey::of::<T>(), Arc::new(value)))
    }

    /// Registers a pre-built shared value for `T` under a binding name.
    pub fn instance_named<T: Clone + Send + Sync + 'static>(&self, name: &'static str, value: T) -> &Self {
        self.insert(Binding::prebuilt(DependencyKey::named::<T>(name), Arc::new(value)))
    }

    /// Runs a provider's registrations against this container.
    pub fn add_provider(&self, provider: &dyn Provider) -> &Self {
        debug!(provider = provider.name(), "Registering provider");
        provider.register(self);
        self
    }

    // ── Resolution ──

    /// Resolves `T`.
    ///
    /// ```rust,ignore
    /// let config: Arc<dyn ConfigStore> = container.resolve()?;
    /// ```
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T> {
        self.resolve_with(Overrides::new())
    }

    /// Resolves `T`, passing explicit arguments to an injectable binding.
    ///
    /// An already built shared instance is returned unchanged and the
    /// arguments are ignored.
    #[instrument(skip(self, overrides), fields(key = %DependencyKey::of::<T>()))]
    pub fn resolve_with<T: Clone + Send + Sync + 'static>(&self, overrides: Overrides) -> Result<T> {
        let key = DependencyKey::of::<T>();
        let erased = self.resolution().resolve_key(&key, overrides)?;
        downcast(&erased, &key)
    }

    /// Resolves the binding of `T` named `name`.
    pub fn resolve_named<T: Clone + Send + Sync + 'static>(&self, name: &'static str) -> Result<T> {
        let key = DependencyKey::named::<T>(name);
        let erased = self.resolution().resolve_key(&key, Overrides::new())?;
        downcast(&erased, &key)
    }

    /// Resolves `Arc<S>`: from its binding when bound, otherwise by
    /// auto-constructing `S` (not cached).
    pub fn make<S: Injectable>(&self) -> Result<Arc<S>> {
        self.make_with(Overrides::new())
    }

    #[instrument(skip(self, overrides), fields(key = %DependencyKey::of::<Arc<S>>()))]
    pub fn make_with<S: Injectable>(&self, overrides: Overrides) -> Result<Arc<S>> {
        let key = DependencyKey::of::<Arc<S>>();
        let resolution = self.resolution();
        let erased = if self.bindings.contains(&key) {
            resolution.resolve_key(&key, overrides)?
        } else {
            resolution.construct_key(&key, construct_erased::<S>, overrides)?
        };
        downcast(&erased, &key)
    }

    /// Produces a fresh `T` from its binding without touching the shared
    /// instance.
    #[instrument(skip(self, overrides), fields(key = %DependencyKey::of::<T>()))]
    pub fn build<T: Clone + Send + Sync + 'static>(&self, overrides: Overrides) -> Result<T> {
        let key = DependencyKey::of::<T>();
        let erased = self.resolution().build_key(&key, overrides)?;
        downcast(&erased, &key)
    }

    /// Constructs a fresh `Arc<S>`: through its binding's producer when it
    /// has one, otherwise straight from `S`'s signature.
    pub fn build_injectable<S: Injectable>(&self, overrides: Overrides) -> Result<Arc<S>> {
        let key = DependencyKey::of::<Arc<S>>();
        let resolution = self.resolution();
        let erased: Erased = match self.bindings.get(&key) {
            Some(binding) if !matches!(binding.producer, Producer::Prebuilt) => {
                resolution.build_key(&key, overrides)?
            }
            _ => resolution.construct_key(&key, construct_erased::<S>, overrides)?,
        };
        downcast(&erased, &key)
    }

    /// Invokes `callable`, resolving each declared parameter.
    #[instrument(skip_all, fields(params = callable.signature().len()))]
    pub fn call<R>(&self, callable: &Callable<'_, R>, overrides: Overrides) -> Result<R> {
        let args = self.resolution().resolve_signature(callable.signature(), overrides)?;
        callable.invoke(&args)
    }

    // ── Introspection ──

    pub fn has<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains(&DependencyKey::of::<T>())
    }

    pub fn is_bound(&self, key: &DependencyKey) -> bool {
        self.bindings.contains(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.len() == 0
    }

    // ── Internal ──

    fn resolution(&self) -> Resolution<'_> {
        Resolution::new(&self.bindings, &self.settings, &self.in_flight)
    }

    fn bind_key<T: Clone + Send + Sync + 'static>(
        &self,
        key: DependencyKey,
        factory: impl Fn(&dyn Resolver) -> Result<T> + Send + Sync + 'static,
        shared: bool,
    ) -> &Self {
        self.insert(Binding::factory(
            key,
            Lifetime::from_shared(shared),
            Arc::new(move |resolver: &dyn Resolver| Ok(Arc::new(factory(resolver)?) as Erased)),
        ))
    }

    fn insert(&self, binding: Binding) -> &Self {
        if let Err(err) = self.bindings.insert(binding, self.settings.allow_override) {
            warn!(error = %err, "Binding ignored");
        }
        self
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bound", &self.bindings.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::attribute::{ContextualAttribute, Injectable};
    pub use crate::error::{BoxError, ContainerError, Result};
    pub use crate::key::DependencyKey;
    pub use crate::lifetime::Lifetime;
    pub use crate::provider::Provider;
    pub use crate::resolution::{Resolver, ResolverExt};
    pub use crate::settings::ContainerSettings;
    pub use crate::signature::{Arguments, Callable, Overrides, Param, Resolved, Signature};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
