//! Declared parameter lists.
//!
//! The container cannot reflect over a Rust function, so every callable and
//! every injectable type declares its parameters up front as a
//! [`Signature`]. Each [`Param`] names the parameter and says how it may be
//! satisfied: a declared type, an optional contextual attribute, and an
//! optional default value.
//!
//! ```
//! use engine_container::prelude::*;
//!
//! let greet = Callable::new(|args: &Arguments| {
//!     let name: String = args.get("name")?;
//!     Ok(format!("hello {name}"))
//! })
//! .param(Param::of::<String>("name"));
//!
//! let container = Container::new();
//! container.instance(String::from("world"));
//! assert_eq!(container.call(&greet, Overrides::new()).unwrap(), "hello world");
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::attribute::{ContextualAttribute, Injectable, construct_erased};
use crate::binding::{ConstructFn, Erased};
use crate::error::{ContainerError, Result, UnresolvableError};
use crate::key::DependencyKey;

/// The value produced for one parameter.
#[derive(Clone)]
pub enum Resolved {
    /// A container value whose concrete type is the declared type.
    Instance(Erased),
    /// A shared service handle; the `Arc` points at the service itself.
    Shared(Erased),
    /// Loosely typed data (configuration values, route arguments).
    Value(Value),
    /// Nothing; readable as `None`.
    Null,
}

impl Resolved {
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Resolved::Instance(Arc::new(value))
    }

    pub fn shared<S: Send + Sync + 'static>(service: Arc<S>) -> Self {
        Resolved::Shared(service)
    }

    /// `Value`, or `Null` when absent.
    pub fn from_value(value: Option<Value>) -> Self {
        value.map_or(Resolved::Null, Resolved::Value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Resolved::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            Resolved::Instance(_) => "container instance",
            Resolved::Shared(_) => "shared service",
            Resolved::Value(_) => "value",
            Resolved::Null => "null",
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(value) => f.debug_tuple("Value").field(value).finish(),
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// One declared parameter.
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    declared: Option<DependencyKey>,
    autowire: Option<ConstructFn>,
    attributes: Vec<Arc<dyn ContextualAttribute>>,
    default: Option<Resolved>,
}

impl Param {
    /// A parameter of declared type `T`, resolvable from a binding for `T`.
    pub fn of<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::with_key(name, Some(DependencyKey::of::<T>()))
    }

    /// A parameter of declared type `T`, resolved from the binding named `binding`.
    pub fn named<T: Send + Sync + 'static>(name: &'static str, binding: &'static str) -> Self {
        Self::with_key(name, Some(DependencyKey::named::<T>(binding)))
    }

    /// A parameter of declared type `Arc<S>` that is auto-constructed when
    /// nothing is bound for it.
    pub fn injectable<S: Injectable>(name: &'static str) -> Self {
        let mut param = Self::with_key(name, Some(DependencyKey::of::<Arc<S>>()));
        param.autowire = Some(construct_erased::<S>);
        param
    }

    /// A parameter with no declared container type (scalars, route
    /// arguments, config values).
    pub fn untyped(name: &'static str) -> Self {
        Self::with_key(name, None)
    }

    fn with_key(name: &'static str, declared: Option<DependencyKey>) -> Self {
        Self {
            name,
            declared,
            autowire: None,
            attributes: Vec::new(),
            default: None,
        }
    }

    /// Attaches a contextual attribute.
    ///
    /// At most one attribute may be attached; more is reported as
    /// `InvalidAttributeUsage` when the parameter is resolved.
    pub fn attribute(mut self, attribute: impl ContextualAttribute + 'static) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Declares a default value of the parameter's type.
    pub fn default_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.default = Some(Resolved::instance(value));
        self
    }

    /// Declares a loosely typed default value.
    pub fn default_json(mut self, value: Value) -> Self {
        self.default = Some(Resolved::Value(value));
        self
    }

    /// Declares `null` as the default.
    pub fn nullable(mut self) -> Self {
        self.default = Some(Resolved::Null);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared(&self) -> Option<&DependencyKey> {
        self.declared.as_ref()
    }

    pub(crate) fn autowire(&self) -> Option<ConstructFn> {
        self.autowire
    }

    pub fn attributes(&self) -> &[Arc<dyn ContextualAttribute>] {
        &self.attributes
    }

    pub fn default(&self) -> Option<&Resolved> {
        self.default.as_ref()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("attributes", &self.attributes)
            .field("default", &self.default)
            .finish()
    }
}

/// An ordered parameter list.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Explicit arguments keyed by parameter name.
///
/// An override always wins over attributes, bindings and defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    values: HashMap<String, Resolved>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides `name` with a value of the parameter's declared type.
    pub fn with<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), Resolved::instance(value));
        self
    }

    /// Overrides `name` with a shared service handle.
    pub fn shared<S: Send + Sync + 'static>(mut self, name: impl Into<String>, service: Arc<S>) -> Self {
        self.values.insert(name.into(), Resolved::shared(service));
        self
    }

    /// Overrides `name` with loosely typed data.
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), Resolved::Value(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<Resolved> {
        self.values.remove(name)
    }
}

/// Resolved arguments of one signature.
///
/// The reader states the type it expects; the accessors enforce it.
#[derive(Debug, Default)]
pub struct Arguments {
    values: HashMap<&'static str, Resolved>,
}

impl Arguments {
    pub(crate) fn insert(&mut self, name: &'static str, value: Resolved) {
        self.values.insert(name, value);
    }

    /// The raw resolved value of `name`.
    pub fn resolved(&self, name: &str) -> Option<&Resolved> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads a container instance of type `T`.
    ///
    /// A shared handle is accepted when the service itself is a `T`; use
    /// [`shared`](Self::shared) to keep its `Arc` instead.
    pub fn get<T: Clone + 'static>(&self, name: &str) -> Result<T> {
        match self.require(name)? {
            Resolved::Instance(erased) | Resolved::Shared(erased) => erased
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| mismatch::<T>(name, "a value of another type")),
            other => Err(mismatch::<T>(name, other.kind())),
        }
    }

    /// Reads a shared service handle of type `S`.
    ///
    /// A container instance holding an `Arc<S>` is accepted too.
    pub fn shared<S: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<S>> {
        self.optional_shared::<S>(name)?
            .ok_or_else(|| mismatch::<Arc<S>>(name, "null"))
    }

    /// Like [`shared`](Self::shared), but `Null` reads as `None`.
    pub fn optional_shared<S: Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<S>>> {
        match self.require(name)? {
            Resolved::Shared(erased) => erased
                .clone()
                .downcast::<S>()
                .map(Some)
                .map_err(|_| mismatch::<Arc<S>>(name, "a service of another type")),
            Resolved::Instance(erased) => erased
                .downcast_ref::<Arc<S>>()
                .cloned()
                .map(Some)
                .ok_or_else(|| mismatch::<Arc<S>>(name, "a value of another type")),
            Resolved::Null => Ok(None),
            Resolved::Value(_) => Err(mismatch::<Arc<S>>(name, "value")),
        }
    }

    /// Reads loosely typed data as `T`.
    ///
    /// When a string does not deserialize as `T` it is read as a scalar
    /// (integer, float, then bool) after trimming, so route argument `"007"`
    /// reads as integer `7`. Only `Null` reads as JSON `null`, which
    /// `Option<T>` accepts; the string `"null"` stays a string.
    pub fn value<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = match self.require(name)? {
            Resolved::Value(value) => value.clone(),
            Resolved::Null => Value::Null,
            other => return Err(mismatch::<T>(name, other.kind())),
        };

        coerce::<T>(value).map_err(|found| mismatch::<T>(name, found))
    }

    fn require(&self, name: &str) -> Result<&Resolved> {
        self.values.get(name).ok_or_else(|| {
            ContainerError::UnresolvableDependency(UnresolvableError {
                requested: None,
                parameter: Some(name.to_string()),
                required_by: None,
                suggestions: self.values.keys().map(|k| k.to_string()).collect(),
                reason: "the parameter is not declared in the signature",
            })
        })
    }
}

fn coerce<T: DeserializeOwned>(value: Value) -> std::result::Result<T, String> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(typed) => Ok(typed),
        Err(first) => match &value {
            Value::String(text) => scalar(text)
                .and_then(|scalar| serde_json::from_value::<T>(scalar).ok())
                .ok_or_else(|| format!("{value} ({first})")),
            _ => Err(format!("{value} ({first})")),
        },
    }
}

fn scalar(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    if let Ok(int) = text.parse::<u64>() {
        return Some(Value::from(int));
    }
    if let Some(number) = text.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return Some(Value::Number(number));
    }
    text.parse::<bool>().ok().map(Value::Bool)
}

fn mismatch<T>(name: &str, found: impl Into<String>) -> ContainerError {
    ContainerError::type_mismatch(format!("parameter `{name}`"), type_name::<T>(), found)
}

type Body<'f, R> = Box<dyn Fn(&Arguments) -> Result<R> + 'f>;

/// A function together with its declared parameters, invokable through
/// [`Container::call`](crate::container::Container::call).
pub struct Callable<'f, R> {
    signature: Signature,
    body: Body<'f, R>,
}

impl<'f, R> Callable<'f, R> {
    pub fn new(body: impl Fn(&Arguments) -> Result<R> + 'f) -> Self {
        Self {
            signature: Signature::new(),
            body: Box::new(body),
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.signature = self.signature.param(param);
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn invoke(&self, args: &Arguments) -> Result<R> {
        (self.body)(args)
    }
}

impl<R> fmt::Debug for Callable<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").field("signature", &self.signature).finish()
    }
}
