//! Error types for container operations.
//!
//! Every resolution failure is immediate and aborts the whole
//! `resolve`/`build`/`call`; nothing here is retried or defaulted.

use std::fmt;

use engine_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Boxed error raised by a resolved service itself.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A required identifier or parameter had nothing to resolve it from.
    #[error("{}", .0)]
    UnresolvableDependency(UnresolvableError),

    /// An identifier was requested again while it was still being built.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A contextual attribute was misused or misconfigured.
    #[error("{}", .0)]
    InvalidAttributeUsage(InvalidAttributeError),

    /// A resolved value was read as a type it does not hold.
    #[error("Type mismatch for {subject}: expected {expected}, found {found}")]
    TypeMismatch {
        subject: String,
        expected: &'static str,
        found: String,
    },

    /// Binding refused because overriding is disabled.
    #[error("{}", .0)]
    AlreadyBound(AlreadyBoundError),

    /// The resolution chain grew past the configured limit.
    #[error("Resolution depth limit of {0} exceeded")]
    DepthExceeded(usize),

    /// Error raised by a resolved service, passed through untouched.
    #[error(transparent)]
    Service(BoxError),
}

impl ContainerError {
    /// Wraps an error raised by a service (a registry, a factory body).
    pub fn service(error: impl Into<BoxError>) -> Self {
        Self::Service(error.into())
    }

    pub(crate) fn type_mismatch(subject: impl Into<String>, expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            subject: subject.into(),
            expected,
            found: found.into(),
        }
    }
}

/// Nothing could satisfy a requested identifier or parameter.
#[derive(Debug)]
pub struct UnresolvableError {
    /// The identifier that was requested, if the failure was type-based.
    pub requested: Option<DependencyKey>,
    /// The parameter being resolved, if any.
    pub parameter: Option<String>,
    /// What was being built when the failure happened.
    pub required_by: Option<DependencyKey>,
    /// Bound identifiers with similar names.
    pub suggestions: Vec<String>,
    /// Why nothing matched.
    pub reason: &'static str,
}

impl fmt::Display for UnresolvableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unresolvable dependency")?;

        match (&self.parameter, &self.requested) {
            (Some(param), Some(key)) => write!(f, ": parameter `{param}` of type {key}")?,
            (Some(param), None) => write!(f, ": parameter `{param}`")?,
            (None, Some(key)) => write!(f, ": {key}")?,
            (None, None) => {}
        }

        write!(f, "\n  Reason: {}", self.reason)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when an identifier transitively requires itself.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain that forms the cycle, first and last entries equal.
    pub chain: Vec<DependencyKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.chain.iter().map(DependencyKey::short_name).collect();
        write!(f, "Circular dependency detected:\n  {}", render_chain(&names))?;
        write!(
            f,
            "\n  Hint: break the cycle with a factory that resolves one side lazily"
        )
    }
}

/// Error when a contextual attribute cannot be applied.
#[derive(Debug)]
pub struct InvalidAttributeError {
    /// Parameter the attribute is attached to.
    pub parameter: String,
    /// Attribute(s) involved.
    pub attributes: Vec<String>,
    pub reason: String,
}

impl fmt::Display for InvalidAttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid contextual attribute usage on parameter `{}` [{}]: {}",
            self.parameter,
            self.attributes.join(", "),
            self.reason,
        )
    }
}

/// Error when binding an identifier that already has a binding.
#[derive(Debug)]
pub struct AlreadyBoundError {
    pub key: DependencyKey,
}

impl fmt::Display for AlreadyBoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already bound: {}", self.key)?;
        write!(f, "\n  Hint: enable `allow_override` in the container settings to replace bindings")
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
