//! The resolution engine.
//!
//! Every top-level `resolve`/`build`/`call` creates one [`Resolution`]. It
//! carries the chain of identifiers currently being produced; re-entering an
//! identifier that is already on the chain is a circular dependency.
//!
//! Factories and contextual attributes receive the in-progress resolution as
//! `&dyn Resolver`, so anything they resolve extends the same chain.
//!
//! Shared bindings are also checked against the container-wide
//! [`InFlight`] graph before their cell is entered, so a cycle split between
//! two threads fails instead of blocking both.

use std::any::type_name;
use std::cell::RefCell;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use engine_support::rendering::suggest_similar;

use crate::attribute::{Injectable, construct_erased};
use crate::binding::{Binding, BindingTable, ConstructFn, Erased, Producer};
use crate::error::{
    CircularDependencyError, ContainerError, InvalidAttributeError, Result, UnresolvableError,
};
use crate::in_flight::{InFlight, WaitGuard};
use crate::key::DependencyKey;
use crate::settings::ContainerSettings;
use crate::signature::{Arguments, Overrides, Param, Resolved, Signature};

/// What factories and contextual attributes resolve through.
pub trait Resolver {
    /// Resolves an identifier, memoising shared bindings.
    fn resolve_key(&self, key: &DependencyKey, overrides: Overrides) -> Result<Erased>;

    /// Produces a fresh value for a bound identifier, bypassing the shared
    /// instance.
    fn build_key(&self, key: &DependencyKey, overrides: Overrides) -> Result<Erased>;

    /// Auto-constructs an injectable that may have no binding.
    fn construct_key(&self, key: &DependencyKey, construct: ConstructFn, overrides: Overrides) -> Result<Erased>;

    /// Resolves every parameter of a signature.
    fn resolve_signature(&self, signature: &Signature, overrides: Overrides) -> Result<Arguments>;

    fn is_bound(&self, key: &DependencyKey) -> bool;
}

/// Typed helpers over any [`Resolver`].
///
/// ```rust,ignore
/// container.singleton::<Arc<Mailer>>(|r| {
///     let transport: Arc<dyn Transport> = r.resolve()?;
///     Ok(Arc::new(Mailer::new(transport)))
/// });
/// ```
pub trait ResolverExt: Resolver {
    fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T> {
        let key = DependencyKey::of::<T>();
        downcast(&self.resolve_key(&key, Overrides::new())?, &key)
    }

    fn resolve_named<T: Clone + Send + Sync + 'static>(&self, name: &'static str) -> Result<T> {
        let key = DependencyKey::named::<T>(name);
        downcast(&self.resolve_key(&key, Overrides::new())?, &key)
    }

    /// Resolves `Arc<S>` from its binding, or auto-constructs it.
    fn make<S: Injectable>(&self) -> Result<Arc<S>> {
        let key = DependencyKey::of::<Arc<S>>();
        let erased = if self.is_bound(&key) {
            self.resolve_key(&key, Overrides::new())?
        } else {
            self.construct_key(&key, construct_erased::<S>, Overrides::new())?
        };
        downcast(&erased, &key)
    }
}

impl<R: Resolver + ?Sized> ResolverExt for R {}

/// Clones a typed value out of an erased container value.
pub(crate) fn downcast<T: Clone + 'static>(erased: &Erased, key: &DependencyKey) -> Result<T> {
    erased
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| ContainerError::type_mismatch(key.to_string(), type_name::<T>(), "a value of another type"))
}

/// One top-level resolution request.
pub(crate) struct Resolution<'c> {
    bindings: &'c BindingTable,
    settings: &'c ContainerSettings,
    in_flight: &'c InFlight,
    chain: RefCell<Vec<DependencyKey>>,
}

/// Pops the chain when an identifier is finished, on success or error.
struct ChainGuard<'r> {
    chain: &'r RefCell<Vec<DependencyKey>>,
}

impl Drop for ChainGuard<'_> {
    fn drop(&mut self) {
        self.chain.borrow_mut().pop();
    }
}

impl<'c> Resolution<'c> {
    pub fn new(bindings: &'c BindingTable, settings: &'c ContainerSettings, in_flight: &'c InFlight) -> Self {
        Self {
            bindings,
            settings,
            in_flight,
            chain: RefCell::new(Vec::new()),
        }
    }

    fn enter(&self, key: &DependencyKey) -> Result<ChainGuard<'_>> {
        let mut chain = self.chain.borrow_mut();

        if let Some(start) = chain.iter().position(|k| k == key) {
            let mut cycle: Vec<DependencyKey> = chain[start..].to_vec();
            cycle.push(key.clone());
            warn!(cycle = ?cycle, "Circular dependency detected");
            return Err(ContainerError::CircularDependency(CircularDependencyError { chain: cycle }));
        }

        if chain.len() >= self.settings.max_depth {
            warn!(depth = chain.len(), key = %key, "Resolution depth limit reached");
            return Err(ContainerError::DepthExceeded(self.settings.max_depth));
        }

        chain.push(key.clone());
        Ok(ChainGuard { chain: &self.chain })
    }

    fn wait_for(&self, key: &DependencyKey) -> Result<WaitGuard<'c>> {
        self.in_flight.wait_for(key).map_err(|path| {
            let mut cycle = self.chain.borrow().clone();
            cycle.extend(path);
            warn!(cycle = ?cycle, "Circular dependency across threads detected");
            ContainerError::CircularDependency(CircularDependencyError { chain: cycle })
        })
    }

    fn binding(&self, key: &DependencyKey) -> Result<Binding> {
        self.bindings
            .get(key)
            .ok_or_else(|| self.unresolvable(Some(key.clone()), None, "nothing is bound for this identifier"))
    }

    fn produce(&self, binding: &Binding, overrides: Overrides) -> Result<Erased> {
        trace!(key = %binding.key, producer = ?binding.producer, "Producing");
        match &binding.producer {
            Producer::Factory(factory) => factory(self),
            Producer::Injectable(construct) => construct(self, overrides),
            Producer::Prebuilt => Err(self.unresolvable(
                Some(binding.key.clone()),
                None,
                "the identifier is bound to a pre-built instance and cannot be rebuilt",
            )),
        }
    }

    fn resolve_param(&self, param: &Param, overrides: &mut Overrides) -> Result<Resolved> {
        if let Some(value) = overrides.take(param.name()) {
            trace!(param = param.name(), "Using explicit argument");
            return Ok(value);
        }

        match param.attributes() {
            [] => {}
            [attribute] => {
                attribute.validate().map_err(|reason| {
                    ContainerError::InvalidAttributeUsage(InvalidAttributeError {
                        parameter: param.name().to_string(),
                        attributes: vec![attribute.label()],
                        reason,
                    })
                })?;
                debug!(param = param.name(), attribute = ?attribute, "Resolving through contextual attribute");
                return attribute.resolve(self);
            }
            many => {
                return Err(ContainerError::InvalidAttributeUsage(InvalidAttributeError {
                    parameter: param.name().to_string(),
                    attributes: many.iter().map(|a| a.label()).collect(),
                    reason: format!("{} contextual attributes attached, at most one is allowed", many.len()),
                }));
            }
        }

        if let Some(key) = param.declared() {
            if self.bindings.contains(key) {
                return self.resolve_key(key, Overrides::new()).map(Resolved::Instance);
            }
            if let Some(construct) = param.autowire() {
                return self.construct_key(key, construct, Overrides::new()).map(Resolved::Instance);
            }
        }

        if let Some(default) = param.default() {
            trace!(param = param.name(), "Using default value");
            return Ok(default.clone());
        }

        Err(self.unresolvable(
            param.declared().cloned(),
            Some(param.name()),
            "no explicit argument, contextual attribute, binding or default value",
        ))
    }

    fn unresolvable(&self, requested: Option<DependencyKey>, parameter: Option<&str>, reason: &'static str) -> ContainerError {
        let suggestions = match &requested {
            Some(key) => {
                let bound: Vec<String> = self.bindings.keys().iter().map(DependencyKey::short_name).collect();
                let bound: Vec<&str> = bound.iter().map(String::as_str).collect();
                suggest_similar(&key.short_name(), &bound, 3)
            }
            None => Vec::new(),
        };

        ContainerError::UnresolvableDependency(UnresolvableError {
            requested,
            parameter: parameter.map(str::to_string),
            required_by: self.chain.borrow().last().cloned(),
            suggestions,
            reason,
        })
    }
}

impl Resolver for Resolution<'_> {
    fn resolve_key(&self, key: &DependencyKey, overrides: Overrides) -> Result<Erased> {
        let binding = self.binding(key)?;

        if let Some(existing) = binding.cached() {
            trace!(key = %key, "Reusing shared instance");
            return Ok(existing.clone());
        }

        let _guard = self.enter(key)?;

        if binding.lifetime.is_shared() {
            let _waiting = self.wait_for(key)?;
            binding
                .instance
                .get_or_try_init(|| {
                    let _building = self.in_flight.build(key);
                    debug!(key = %key, "Creating shared instance");
                    self.produce(&binding, overrides)
                })
                .cloned()
        } else {
            self.produce(&binding, overrides)
        }
    }

    fn build_key(&self, key: &DependencyKey, overrides: Overrides) -> Result<Erased> {
        let binding = self.binding(key)?;
        let _guard = self.enter(key)?;
        self.produce(&binding, overrides)
    }

    fn construct_key(&self, key: &DependencyKey, construct: ConstructFn, overrides: Overrides) -> Result<Erased> {
        let _guard = self.enter(key)?;
        trace!(key = %key, "Auto-constructing");
        construct(self, overrides)
    }

    fn resolve_signature(&self, signature: &Signature, mut overrides: Overrides) -> Result<Arguments> {
        let mut args = Arguments::default();
        for param in signature.params() {
            let value = self.resolve_param(param, &mut overrides)?;
            args.insert(param.name(), value);
        }
        Ok(args)
    }

    fn is_bound(&self, key: &DependencyKey) -> bool {
        self.bindings.contains(key)
    }
}
