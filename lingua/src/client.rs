use std::sync::Arc;

use lingua_extraction::{
    Backend, BackendKind, BackendRegistry, ChainRegistry, ExtractionOutcome, ExtractionRequest,
    FallbackFetcher, MonitoringSink, ProviderChainConfig, StructuredExtractor,
};
use lingua_learning_context::{
    HistoryQuery, HistorySource, LearningContextCandidate, LearningContextSampler,
};
use rand::Rng;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::errors::Error;

/// Serves exercise-generation features from their configured provider chains.
///
/// Cheap to clone; chains and adapters are shared.
#[derive(Debug, Clone)]
pub struct Client {
    chains: Arc<ChainRegistry>,
    extractor: StructuredExtractor,
    sampler: LearningContextSampler,
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    chains: Option<Arc<ChainRegistry>>,
    backends: BackendRegistry,
    sink: Option<Arc<dyn MonitoringSink>>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Creates a builder with no chains and no backends.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-feature chains.
    #[must_use]
    pub fn chains(mut self, chains: impl Into<Arc<ChainRegistry>>) -> Self {
        self.chains = Some(chains.into());
        self
    }

    /// Registers the adapter serving `kind`.
    #[must_use]
    pub fn backend(mut self, kind: BackendKind, adapter: Arc<dyn Backend>) -> Self {
        self.backends = self.backends.with_backend(kind, adapter);
        self
    }

    /// Replaces the default tracing sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the shared configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the client. Every chain lint is logged as a warning.
    #[must_use]
    pub fn build(self) -> Client {
        let chains = self.chains.unwrap_or_default();
        for problem in chains.lint(Some(&self.backends)) {
            tracing::warn!(target: "lingua", "{problem}");
        }

        let mut fetcher = FallbackFetcher::new(self.backends);
        if let Some(sink) = self.sink {
            fetcher = fetcher.with_sink(sink);
        }

        Client {
            chains,
            extractor: StructuredExtractor::with_config(fetcher, self.config.extraction),
            sampler: LearningContextSampler::new().with_pool_size(self.config.sampler_pool_size),
        }
    }
}

impl Client {
    /// Starts building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The configured chains.
    #[must_use]
    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// The chain configured for `feature`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownFeature`] if no chain is registered under it.
    pub fn chain(&self, feature: &str) -> Result<&ProviderChainConfig, Error> {
        self.chains
            .get(feature)
            .ok_or_else(|| Error::UnknownFeature(feature.to_string()))
    }

    /// Plain-text generation: the first usable reply from the feature's chain,
    /// or `None` if every provider failed.
    ///
    /// # Errors
    /// Returns [`Error::UnknownFeature`] for an unregistered feature.
    pub async fn fetch(&self, feature: &str, prompt: &str) -> Result<Option<String>, Error> {
        let chain = self.chain(feature)?;
        Ok(self.extractor.fetcher().fetch(prompt, chain).await)
    }

    /// Structured generation over the feature's chain.
    ///
    /// # Errors
    /// Returns [`Error::UnknownFeature`] for an unregistered feature and
    /// [`Error::Extraction`] when its chain has no schema.
    pub async fn extract<T>(
        &self,
        feature: &str,
        request: ExtractionRequest<T>,
    ) -> Result<ExtractionOutcome<T>, Error>
    where
        T: DeserializeOwned,
    {
        let chain = self.chain(feature)?;
        Ok(self.extractor.extract(chain, request).await?)
    }

    /// Samples a past exercise to enrich the next prompt.
    ///
    /// # Errors
    /// Returns [`Error::History`] when the history source fails.
    pub async fn learning_context<R>(
        &self,
        query: &HistoryQuery,
        source: &dyn HistorySource,
        rng: &mut R,
    ) -> Result<Option<LearningContextCandidate>, Error>
    where
        R: Rng,
    {
        Ok(self.sampler.sample_for(query, source, rng).await?)
    }
}
