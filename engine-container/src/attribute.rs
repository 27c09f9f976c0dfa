//! Contextual attributes and injectable types.
//!
//! A [`ContextualAttribute`] decides a parameter's value from *how* the
//! parameter is used rather than from its declared type: "the cache named
//! `redis`", "the current user". The container hands it the in-progress
//! [`Resolver`] and uses whatever it returns verbatim.
//!
//! An [`Injectable`] type declares its constructor parameters so the
//! container can build it without a hand-written factory.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use engine_support::rendering::shorten_type_name;

use crate::binding::Erased;
use crate::error::Result;
use crate::resolution::Resolver;
use crate::signature::{Arguments, Overrides, Resolved, Signature};

/// A per-parameter resolution policy.
///
/// Implementations are small immutable value objects. They must not cache:
/// every resolution asks the underlying service again.
///
/// ```
/// use engine_container::prelude::*;
/// use serde_json::json;
///
/// #[derive(Debug)]
/// struct Answer;
///
/// impl ContextualAttribute for Answer {
///     fn resolve(&self, _resolver: &dyn Resolver) -> Result<Resolved> {
///         Ok(Resolved::Value(json!(42)))
///     }
/// }
///
/// let action = Callable::new(|args: &Arguments| args.value::<i64>("n"))
///     .param(Param::untyped("n").attribute(Answer));
///
/// assert_eq!(Container::new().call(&action, Overrides::new()).unwrap(), 42);
/// ```
pub trait ContextualAttribute: fmt::Debug + Send + Sync {
    /// Produces the parameter's value.
    fn resolve(&self, resolver: &dyn Resolver) -> Result<Resolved>;

    /// Checks the attribute's own configuration before it is resolved.
    ///
    /// The error string becomes the reason of an `InvalidAttributeUsage`.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Name used in diagnostics.
    fn label(&self) -> String {
        shorten_type_name(type_name::<Self>())
    }
}

/// A type the container can construct from a declared signature.
///
/// Injectable types are bound and resolved as `Arc<Self>`.
///
/// ```
/// use engine_container::prelude::*;
/// use std::sync::Arc;
///
/// struct Channel(String);
///
/// impl Injectable for Channel {
///     fn signature() -> Signature {
///         Signature::new().param(Param::of::<String>("name").default_value(String::from("app")))
///     }
///
///     fn construct(args: &Arguments) -> Result<Self> {
///         Ok(Channel(args.get("name")?))
///     }
/// }
///
/// let container = Container::new();
/// let channel: Arc<Channel> = container.make().unwrap();
/// assert_eq!(channel.0, "app");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The constructor's parameters.
    fn signature() -> Signature;

    /// Builds the value from resolved arguments.
    fn construct(args: &Arguments) -> Result<Self>;
}

/// Type-erased construction of an injectable, stored as `Arc<S>`.
pub(crate) fn construct_erased<S: Injectable>(resolver: &dyn Resolver, overrides: Overrides) -> Result<Erased> {
    let args = resolver.resolve_signature(&S::signature(), overrides)?;
    let built: Arc<S> = Arc::new(S::construct(&args)?);
    Ok(Arc::new(built))
}
