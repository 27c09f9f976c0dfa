//! Container settings.
//!
//! Settings are plain serde data so the bootstrap can read them out of the
//! application configuration (the `container` section).

use serde::{Deserialize, Serialize};

/// Default cap on nested resolutions within one request.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Tunables for a [`Container`](crate::container::Container).
///
/// ```
/// use engine_container::settings::ContainerSettings;
///
/// let settings = ContainerSettings::default();
/// assert!(settings.allow_override);
/// assert_eq!(settings.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Whether binding an already bound identifier replaces the old binding.
    pub allow_override: bool,
    /// Maximum length of a resolution chain.
    pub max_depth: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            allow_override: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContainerSettings {
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
