//! Binding identifiers.
//!
//! A [`DependencyKey`] is what the container looks bindings up by: a Rust
//! type plus an optional binding name. The name lets one handle type be bound
//! several times, e.g. one named registry per framework subsystem.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use engine_support::rendering::shorten_type_name;

/// Identifies a binding in the container.
///
/// Equality and hashing use the type and the binding name; the type name is
/// carried along for diagnostics only.
///
/// ```
/// use engine_container::key::DependencyKey;
///
/// let plain = DependencyKey::of::<String>();
/// let named = DependencyKey::named::<String>("cache");
///
/// assert_eq!(plain.type_name(), "alloc::string::String");
/// assert_eq!(named.name(), Some("cache"));
/// assert_ne!(plain, named);
/// assert_eq!(named.to_string(), "alloc::string::String#cache");
/// ```
#[derive(Clone)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl DependencyKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: None,
        }
    }

    /// Key of the binding of `T` registered under `name`.
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self::of::<T>().with_name(name)
    }

    pub fn with_name(self, name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..self
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// `Arc<Mailer>#mail`: the key with module paths stripped.
    pub fn short_name(&self) -> String {
        let short = shorten_type_name(self.type_name);
        match self.name {
            Some(name) => format!("{short}#{name}"),
            None => short,
        }
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        (self.type_id, self.name) == (other.type_id, other.name)
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.type_id, self.name).hash(state);
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)?;
        if let Some(name) = self.name {
            write!(f, "#{name}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({self})")
    }
}
