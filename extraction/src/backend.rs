//! The backend seam: one adapter per [`BackendKind`], resolved by lookup.
//!
//! Adapters themselves (the network calls) live with the application; this
//! crate only knows the contract `send(prompt, schema hint) -> text`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::chain::{BackendDescriptor, BackendKind};

/// Failures an adapter may report.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport or provider-side failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The adapter gave up waiting for the provider.
    #[error("request timed out")]
    Timeout,

    /// The provider answered without usable text.
    #[error("backend returned an empty response")]
    EmptyResponse,

    /// The backend is not reachable or not configured.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// A single call into a backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    /// Prompt text.
    pub prompt: &'a str,
    /// Which model and tuning to use.
    pub descriptor: &'a BackendDescriptor,
    /// Output schema the reply should follow, when the chain has one.
    pub schema_hint: Option<&'a Value>,
}

/// A text-generation backend.
///
/// Implementors must be `Send + Sync`; one instance serves every chain that
/// names its kind.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Sends the prompt and returns the reply text.
    async fn send(&self, request: BackendRequest<'_>) -> Result<String, BackendError>;
}

/// Lookup table from backend kind to adapter.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    adapters: HashMap<BackendKind, Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the adapter serving `kind`, replacing any previous one.
    #[must_use]
    pub fn with_backend(mut self, kind: BackendKind, adapter: Arc<dyn Backend>) -> Self {
        self.adapters.insert(kind, adapter);
        self
    }

    /// Resolves the adapter for a descriptor.
    #[must_use]
    pub fn resolve(&self, descriptor: &BackendDescriptor) -> Option<Arc<dyn Backend>> {
        self.adapters.get(&descriptor.kind()).cloned()
    }

    /// Whether an adapter is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: BackendKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
