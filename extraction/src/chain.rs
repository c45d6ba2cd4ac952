//! Provider chain configuration.
//!
//! A [`ProviderChainConfig`] describes, for one feature, which backends to try
//! and in what order. The [`ChainRegistry`] maps feature names to chains; it is
//! assembled once at startup and shared read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::backend::BackendRegistry;
use crate::schema::{OutputSchema, SchemaError};

/// Errors raised while loading a chain registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The registry file could not be read.
    #[error("failed to read chain registry {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The registry document is not valid JSON or has the wrong shape.
    #[error("invalid chain registry: {0}")]
    Parse(#[from] serde_json::Error),

    /// A chain's schema did not compile.
    #[error("chain '{feature}' has an invalid schema: {source}")]
    Schema {
        /// Feature whose chain failed.
        feature: String,
        /// Compilation failure.
        #[source]
        source: SchemaError,
    },
}

/// The family a backend belongs to; used as the adapter lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Google Gemini models.
    Gemini,
    /// OpenAI chat models.
    OpenAi,
    /// Anthropic models.
    Anthropic,
    /// Locally hosted models served by Ollama.
    Ollama,
}

impl BackendKind {
    /// Stable lowercase name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "open_ai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend in a chain plus its per-call tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendDescriptor {
    /// A Gemini model.
    Gemini {
        /// Model identifier.
        model: String,
        /// Sampling temperature.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
    /// An OpenAI model.
    OpenAi {
        /// Model identifier.
        model: String,
        /// Sampling temperature.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
    /// An Anthropic model.
    Anthropic {
        /// Model identifier.
        model: String,
        /// Sampling temperature.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
        /// Reply length cap.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u32>,
    },
    /// A model served by a local Ollama instance.
    Ollama {
        /// Model identifier.
        model: String,
        /// Sampling temperature.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f32>,
    },
}

impl BackendDescriptor {
    /// The adapter family this descriptor resolves to.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Gemini { .. } => BackendKind::Gemini,
            Self::OpenAi { .. } => BackendKind::OpenAi,
            Self::Anthropic { .. } => BackendKind::Anthropic,
            Self::Ollama { .. } => BackendKind::Ollama,
        }
    }

    /// The configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. }
            | Self::OpenAi { model, .. }
            | Self::Anthropic { model, .. }
            | Self::Ollama { model, .. } => model,
        }
    }

    /// The configured temperature, if any.
    #[must_use]
    pub const fn temperature(&self) -> Option<f32> {
        match self {
            Self::Gemini { temperature, .. }
            | Self::OpenAi { temperature, .. }
            | Self::Anthropic { temperature, .. }
            | Self::Ollama { temperature, .. } => *temperature,
        }
    }
}

/// Ordered backends for one feature, plus the optional output schema.
///
/// An empty `providers` list is allowed to exist but every call through it
/// fails without contacting a backend.
#[derive(Debug, Clone, Default)]
pub struct ProviderChainConfig {
    /// Backends in the order they are tried.
    pub providers: Vec<BackendDescriptor>,
    /// Shape the reply must take; required for structured extraction.
    pub schema: Option<OutputSchema>,
    /// Label attached to diagnostics.
    pub label: Option<String>,
}

impl ProviderChainConfig {
    /// Creates a chain over `providers` with no schema and no label.
    #[must_use]
    pub const fn new(providers: Vec<BackendDescriptor>) -> Self {
        Self {
            providers,
            schema: None,
            label: None,
        }
    }

    /// Attaches an output schema.
    #[must_use]
    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Attaches a diagnostic label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for diagnostics, `"unlabeled"` when none was configured.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("unlabeled")
    }
}

/// On-disk form of a single chain.
#[derive(Debug, Deserialize)]
struct ChainFile {
    providers: Vec<BackendDescriptor>,
    #[serde(default)]
    schema: Option<Value>,
    #[serde(default)]
    label: Option<String>,
}

/// On-disk form of the registry.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    chains: BTreeMap<String, ChainFile>,
}

/// Feature name to chain mapping, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<String, ProviderChainConfig>,
}

impl ChainRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the chain for `feature`.
    #[must_use]
    pub fn with_chain(mut self, feature: impl Into<String>, chain: ProviderChainConfig) -> Self {
        self.chains.insert(feature.into(), chain);
        self
    }

    /// Parses a registry document.
    ///
    /// ```
    /// use lingua_extraction::ChainRegistry;
    ///
    /// let registry = ChainRegistry::from_json_str(r#"{
    ///     "chains": {
    ///         "translation": {
    ///             "label": "translation",
    ///             "providers": [{"kind": "gemini", "model": "gemini-2.0-flash", "temperature": 0.7}]
    ///         }
    ///     }
    /// }"#).unwrap();
    /// assert_eq!(registry.get("translation").unwrap().providers.len(), 1);
    /// ```
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_json::from_str(source)?;
        let mut chains = BTreeMap::new();

        for (feature, chain) in file.chains {
            let schema = chain
                .schema
                .map(OutputSchema::new)
                .transpose()
                .map_err(|source| ConfigError::Schema {
                    feature: feature.clone(),
                    source,
                })?;

            chains.insert(
                feature,
                ProviderChainConfig {
                    providers: chain.providers,
                    schema,
                    label: chain.label,
                },
            );
        }

        Ok(Self { chains })
    }

    /// Reads and parses a registry file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    /// The chain configured for `feature`.
    #[must_use]
    pub fn get(&self, feature: &str) -> Option<&ProviderChainConfig> {
        self.chains.get(feature)
    }

    /// All chains, ordered by feature name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderChainConfig)> {
        self.chains.iter().map(|(name, chain)| (name.as_str(), chain))
    }

    /// Number of configured features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no feature is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Reports configuration problems that would only surface at call time.
    ///
    /// When `backends` is given, descriptors whose kind has no registered
    /// adapter are reported as well.
    #[must_use]
    pub fn lint(&self, backends: Option<&BackendRegistry>) -> Vec<String> {
        let mut findings = Vec::new();

        for (feature, chain) in &self.chains {
            if chain.providers.is_empty() {
                findings.push(format!("chain '{feature}' has no providers"));
            }

            let Some(backends) = backends else { continue };
            for (index, descriptor) in chain.providers.iter().enumerate() {
                if !backends.contains(descriptor.kind()) {
                    findings.push(format!(
                        "chain '{feature}' provider {} ({}) has no registered backend",
                        index + 1,
                        descriptor.kind()
                    ));
                }
            }
        }

        findings
    }
}
