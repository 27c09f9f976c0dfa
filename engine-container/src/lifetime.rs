//! Binding lifetimes.
//!
//! - [`Lifetime::Singleton`]: produced once, shared for the container's life
//! - [`Lifetime::Transient`]: produced anew on every resolve
//!
//! Pre-built instances registered with `instance()` are singletons whose
//! value already exists.
use std::fmt;

/// How long a produced value lives in the container.
///
/// ```
/// use engine_container::lifetime::Lifetime;
///
/// assert!(Lifetime::from_shared(true).is_shared());
/// assert_eq!(Lifetime::from_shared(false), Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Created on first resolve and reused until the container is dropped.
    ///
    /// Registries and configuration are singletons in a bootstrapped engine.
    Singleton,

    /// A new value on every resolve; never cached.
    Transient,
}

impl Lifetime {
    /// Maps the `shared` flag of `bind` to a lifetime.
    #[inline]
    pub fn from_shared(shared: bool) -> Self {
        if shared { Lifetime::Singleton } else { Lifetime::Transient }
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_flag_mapping() {
        assert_eq!(Lifetime::from_shared(true), Lifetime::Singleton);
        assert!(!Lifetime::from_shared(false).is_shared());
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Singleton), "Singleton");
        assert_eq!(format!("{}", Lifetime::Transient), "Transient");
    }
}
