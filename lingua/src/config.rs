//! Shared client configuration.

use std::path::PathBuf;

use lingua_extraction::ExtractionConfig;
use lingua_learning_context::DEFAULT_POOL_SIZE;

/// Environment variable overriding the chain registry location.
pub const CHAINS_ENV_VAR: &str = "LINGUA_CHAINS";

/// Configuration shared by every call made through a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retry defaults for structured extraction.
    pub extraction: ExtractionConfig,

    /// Breadth-stage pool size for learning-context sampling.
    ///
    /// Default: 30
    pub sampler_pool_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            sampler_pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new `ClientConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extraction retry defaults.
    #[must_use]
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Set the sampler pool size.
    #[must_use]
    pub const fn with_sampler_pool_size(mut self, pool_size: usize) -> Self {
        self.sampler_pool_size = pool_size;
        self
    }
}

/// `<config dir>/lingua/chains.json`, where the platform has a config dir.
#[must_use]
pub fn default_chains_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lingua").join("chains.json"))
}

/// Picks the registry file: an explicit path, then [`CHAINS_ENV_VAR`], then
/// [`default_chains_path`].
#[must_use]
pub fn resolve_chains_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| std::env::var_os(CHAINS_ENV_VAR).map(PathBuf::from))
        .or_else(default_chains_path)
}
