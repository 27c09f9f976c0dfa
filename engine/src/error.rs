/// Errors raised while bootstrapping an [`Engine`](crate::Engine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The configuration could not be read or did not match its schema.
    #[error("Invalid configuration: {0}")]
    Config(Box<figment::Error>),
}

impl From<figment::Error> for EngineError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}
