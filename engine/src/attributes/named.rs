use engine_container::{ContextualAttribute, Resolved, Resolver, Result};

use super::{load_named, require_key};
use crate::services::Subsystem;

macro_rules! keyed_attribute {
    ($(#[$doc:meta])* $name:ident => $subsystem:expr, $what:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            key: Option<String>,
        }

        impl $name {
            /// Uses the registry's default key.
            pub fn new() -> Self {
                Self::default()
            }

            pub fn key(key: impl Into<String>) -> Self {
                Self { key: Some(key.into()) }
            }

            pub fn configured_key(&self) -> Option<&str> {
                self.key.as_deref()
            }
        }

        impl ContextualAttribute for $name {
            fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved> {
                load_named(resolver, $subsystem, self.key.as_deref())
            }

            fn validate(&self) -> std::result::Result<(), String> {
                match &self.key {
                    Some(key) => require_key($what, key),
                    None => Ok(()),
                }
            }
        }
    };
}

keyed_attribute!(
    /// The cache store keyed by `key`.
    Cache => Subsystem::Cache, "cache key"
);

keyed_attribute!(
    /// The database connection keyed by `key`.
    Db => Subsystem::Database, "connection key"
);

keyed_attribute!(
    /// The encrypter keyed by `key`.
    Encryption => Subsystem::Encryption, "encrypter key"
);

keyed_attribute!(
    /// The log channel keyed by `key`.
    Log => Subsystem::Log, "log channel key"
);

keyed_attribute!(
    /// The mailer keyed by `key`.
    Mail => Subsystem::Mail, "mailer key"
);

/// The ORM model registered under `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orm {
    alias: String,
}

impl Orm {
    pub fn new(alias: impl Into<String>) -> Self {
        Self { alias: alias.into() }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl ContextualAttribute for Orm {
    fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved> {
        load_named(resolver, Subsystem::Orm, Some(&self.alias))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        require_key("model alias", &self.alias)
    }
}
