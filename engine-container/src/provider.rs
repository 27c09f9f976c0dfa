//! Providers: modules of related bindings.
//!
//! A provider groups the registrations of one area of an application
//! (mail, persistence, HTTP) so bootstrap code stays a list of providers
//! instead of one long block of `bind` calls.
//!
//! # Examples
//! ```rust,ignore
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, container: &Container) {
//!         container
//!             .singleton::<Arc<dyn Transport>>(|_| Ok(Arc::new(SmtpTransport::default())))
//!             .singleton_injectable::<Mailer>();
//!     }
//! }
//!
//! container.add_provider(&MailProvider);
//! ```

use crate::container::Container;

/// A module that registers related bindings into a container.
pub trait Provider: Send + Sync {
    /// Registers bindings. Called once, during bootstrap.
    fn register(&self, container: &Container);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
