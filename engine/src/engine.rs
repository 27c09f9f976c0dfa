//! Application bootstrap.
//!
//! An [`Engine`] is a [`Container`] that has already been wired with the
//! application configuration, the subsystem registries and the current
//! request. It derefs to the container, so every container operation is
//! available on it directly.
//!
//! ```rust,ignore
//! let engine = Engine::builder()
//!     .config(Figment::new().merge(Toml::file("engine.toml")))
//!     .registry(Subsystem::Log, LogManager::default())
//!     .provider(MailProvider)
//!     .build()?;
//!
//! let logger: Arc<dyn Logger> = engine.resolve()?;
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use engine_container::{Container, ContainerError, ContainerSettings, Provider};
use figment::Figment;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::error::EngineError;
use crate::services::{AuthService, ConfigStore, NamedRegistry, RegistryHandle, ServerRequest, Subsystem};

/// Configuration section holding [`ContainerSettings`].
pub const SETTINGS_SECTION: &str = "container";

static INSTANCE: Lazy<RwLock<Option<Arc<Engine>>>> = Lazy::new(|| RwLock::new(None));

type RequestSlot = Arc<RwLock<Option<Arc<dyn ServerRequest>>>>;

/// A bootstrapped application container.
pub struct Engine {
    container: Container,
    config: Figment,
    request: RequestSlot,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The configuration the engine was built from.
    pub fn config(&self) -> &Figment {
        &self.config
    }

    /// Makes `request` the request seen by `Arc<dyn ServerRequest>` lookups.
    pub fn set_request(&self, request: impl ServerRequest + 'static) {
        *self.request.write() = Some(Arc::new(request));
    }

    pub fn clear_request(&self) {
        self.request.write().take();
    }

    // ── Ambient handle ──

    /// Installs the process-wide engine, returning the one it replaces.
    pub fn set_instance(engine: Arc<Engine>) -> Option<Arc<Engine>> {
        debug!("Installing ambient engine");
        INSTANCE.write().replace(engine)
    }

    /// The process-wide engine, if one is installed.
    pub fn instance() -> Option<Arc<Engine>> {
        INSTANCE.read().clone()
    }

    /// Removes the process-wide engine.
    pub fn clear_instance() -> Option<Arc<Engine>> {
        debug!("Clearing ambient engine");
        INSTANCE.write().take()
    }
}

impl Deref for Engine {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("container", &self.container)
            .field("has_request", &self.request.read().is_some())
            .finish()
    }
}

/// The process-wide engine installed with [`Engine::set_instance`].
pub fn app() -> Option<Arc<Engine>> {
    Engine::instance()
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    config: Figment,
    settings: Option<ContainerSettings>,
    registries: Vec<(Subsystem, RegistryHandle)>,
    auth: Option<Arc<dyn AuthService>>,
    request: Option<Arc<dyn ServerRequest>>,
    providers: Vec<Box<dyn Provider>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Figment::new(),
            settings: None,
            registries: Vec::new(),
            auth: None,
            request: None,
            providers: Vec::new(),
        }
    }
}

impl EngineBuilder {
    pub fn config(mut self, config: Figment) -> Self {
        self.config = config;
        self
    }

    /// Container settings; takes precedence over the `container` section
    /// of the configuration.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn registry(mut self, subsystem: Subsystem, registry: impl NamedRegistry + 'static) -> Self {
        self.registries.push((subsystem, Arc::new(registry)));
        self
    }

    pub fn auth(mut self, auth: impl AuthService + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    pub fn request(mut self, request: impl ServerRequest + 'static) -> Self {
        self.request = Some(Arc::new(request));
        self
    }

    /// Adds a provider. Providers run in the order they were added, after
    /// the engine's own registrations.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    #[instrument(skip(self), fields(registries = self.registries.len(), providers = self.providers.len()))]
    pub fn build(self) -> Result<Engine, EngineError> {
        let settings = match self.settings {
            Some(settings) => settings,
            None => settings_from(&self.config)?,
        };
        let container = Container::with_settings(settings.clone());

        container
            .instance(settings)
            .instance(self.config.clone())
            .instance::<Arc<dyn ConfigStore>>(Arc::new(self.config.clone()));

        for (subsystem, registry) in self.registries {
            debug!(%subsystem, "Registering subsystem registry");
            container.instance_named(subsystem.name(), registry);
        }

        if let Some(auth) = self.auth {
            container.instance(auth);
        }

        let request: RequestSlot = Arc::new(RwLock::new(self.request));
        let slot = Arc::clone(&request);
        container.bind::<Arc<dyn ServerRequest>>(
            move |_| {
                slot.read()
                    .clone()
                    .ok_or_else(|| ContainerError::service("no server request is being handled"))
            },
            false,
        );

        for provider in &self.providers {
            container.add_provider(provider.as_ref());
        }

        info!(bindings = container.len(), "Engine ready");
        Ok(Engine {
            container,
            config: self.config,
            request,
        })
    }
}

/// Reads [`ContainerSettings`] from the `container` section, falling back
/// to defaults when the section is absent.
fn settings_from(config: &Figment) -> Result<ContainerSettings, EngineError> {
    match config.extract_inner::<ContainerSettings>(SETTINGS_SECTION) {
        Ok(settings) => Ok(settings),
        Err(error) if error.missing() => Ok(ContainerSettings::default()),
        Err(error) => Err(error.into()),
    }
}
