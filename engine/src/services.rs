//! Contracts of the subsystems the container hands out.
//!
//! The container never implements caching, persistence, mail or routing
//! itself. It only needs to ask a registered collaborator for "the service
//! keyed by X"; these traits are that conversation.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use engine_container::{BoxError, DependencyKey};
use figment::Figment;
use serde_json::Value;

/// A shared, type-erased service handle.
///
/// The `Arc` points at the service itself, so the call site reads it back
/// with `Arguments::shared::<ConcreteService>()`.
pub type Service = Arc<dyn Any + Send + Sync>;

/// How a registry is stored in the container.
pub type RegistryHandle = Arc<dyn NamedRegistry>;

/// A registry of named service instances (cache stores, connections,
/// log channels, mailers, encrypters, ORM models).
pub trait NamedRegistry: Send + Sync {
    /// Key used when a parameter does not name one.
    fn default_key(&self) -> &str {
        "default"
    }

    /// Returns the service registered under `key`.
    fn load(&self, key: &str) -> Result<Service, BoxError>;
}

/// The named subsystems an engine wires registries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Cache,
    Database,
    Encryption,
    Log,
    Mail,
    Orm,
}

impl Subsystem {
    pub const ALL: [Subsystem; 6] = [
        Subsystem::Cache,
        Subsystem::Database,
        Subsystem::Encryption,
        Subsystem::Log,
        Subsystem::Mail,
        Subsystem::Orm,
    ];

    /// Binding name of the subsystem's registry.
    pub fn name(self) -> &'static str {
        match self {
            Subsystem::Cache => "cache",
            Subsystem::Database => "db",
            Subsystem::Encryption => "encryption",
            Subsystem::Log => "log",
            Subsystem::Mail => "mail",
            Subsystem::Orm => "orm",
        }
    }

    /// Container key of the subsystem's registry.
    pub fn key(self) -> DependencyKey {
        DependencyKey::named::<RegistryHandle>(self.name())
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read access to application configuration by dotted key.
pub trait ConfigStore: Send + Sync {
    /// Value at `key` (for example `"app.name"`), or `None` when absent.
    fn get(&self, key: &str) -> Option<Value>;
}

impl ConfigStore for Figment {
    fn get(&self, key: &str) -> Option<Value> {
        self.find_value(key).ok()?.deserialize::<Value>().ok()
    }
}

/// The authentication subsystem.
pub trait AuthService: Send + Sync {
    /// The authenticated user of the current request, if any.
    fn user(&self) -> Option<Service>;
}

/// The in-flight server request.
pub trait ServerRequest: Send + Sync {
    /// Argument captured by the matched route, or `None`.
    fn route_argument(&self, name: &str) -> Option<Value>;
}

/// A request that carries only the matched route's arguments.
#[derive(Debug, Clone, Default)]
pub struct MatchedRoute {
    pattern: String,
    arguments: HashMap<String, Value>,
}

impl MatchedRoute {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl ServerRequest for MatchedRoute {
    fn route_argument(&self, name: &str) -> Option<Value> {
        self.arguments.get(name).cloned()
    }
}
