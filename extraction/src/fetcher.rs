//! Fallback reply fetcher: walks a chain until one backend produces text.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::backend::{BackendError, BackendRegistry, BackendRequest};
use crate::chain::{BackendDescriptor, ProviderChainConfig};
use crate::monitoring::{EventKind, MonitoringEvent, MonitoringSink, TracingSink};

/// Tries each backend of a chain in order and returns the first non-empty
/// reply.
///
/// Backends are called strictly one after another; a slow adapter delays the
/// rest of the chain. No failure escapes: adapter errors, empty replies,
/// missing adapters and panicking adapters all mean "try the next one".
#[derive(Clone)]
pub struct FallbackFetcher {
    backends: BackendRegistry,
    sink: Arc<dyn MonitoringSink>,
}

impl FallbackFetcher {
    /// Creates a fetcher that reports to [`TracingSink`].
    #[must_use]
    pub fn new(backends: BackendRegistry) -> Self {
        Self {
            backends,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the monitoring sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The sink diagnostics are sent to.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn MonitoringSink> {
        &self.sink
    }

    /// The adapter lookup table.
    #[must_use]
    pub const fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Records an `empty_chain` event for `chain`.
    pub fn report_empty_chain(&self, chain: &ProviderChainConfig) {
        let label = chain.display_label();
        self.sink.record(
            MonitoringEvent::new(
                EventKind::EmptyChain,
                format!("Provider chain '{label}' has no providers"),
            )
            .param("label", label),
        );
    }

    /// Returns the first usable reply, or `None` when the chain is exhausted.
    pub async fn fetch(&self, prompt: &str, chain: &ProviderChainConfig) -> Option<String> {
        let label = chain.display_label();
        let count = chain.providers.len();

        if count == 0 {
            self.report_empty_chain(chain);
            return None;
        }

        let schema_hint = chain.schema.as_ref().map(|schema| schema.as_value());

        for (index, descriptor) in chain.providers.iter().enumerate() {
            let position = index + 1;
            tracing::debug!(
                target: "lingua",
                label,
                provider_index = position,
                provider_count = count,
                backend = %descriptor.kind(),
                "Trying provider"
            );

            match self.try_provider(prompt, descriptor, schema_hint).await {
                Ok(reply) => {
                    if index > 0 {
                        self.sink.record(
                            Self::provider_event(
                                EventKind::FallbackUsed,
                                format!("Used fallback provider {position} of {count}"),
                                label,
                                position,
                                count,
                                descriptor,
                            )
                            .info(),
                        );
                    }
                    return Some(reply);
                }
                Err(error) => {
                    self.sink.record(
                        Self::provider_event(
                            EventKind::ProviderFailed,
                            format!("Provider {position} of {count} failed"),
                            label,
                            position,
                            count,
                            descriptor,
                        )
                        .error(error),
                    );
                }
            }
        }

        self.sink.record(
            MonitoringEvent::new(
                EventKind::AllProvidersFailed,
                format!("All {count} providers failed"),
            )
            .param("label", label)
            .param("provider_count", count),
        );
        None
    }

    async fn try_provider(
        &self,
        prompt: &str,
        descriptor: &BackendDescriptor,
        schema_hint: Option<&serde_json::Value>,
    ) -> Result<String, String> {
        let adapter = self
            .backends
            .resolve(descriptor)
            .ok_or_else(|| format!("no backend registered for kind '{}'", descriptor.kind()))?;

        let request = BackendRequest {
            prompt,
            descriptor,
            schema_hint,
        };

        let reply = AssertUnwindSafe(adapter.send(request))
            .catch_unwind()
            .await
            .map_err(|payload| format!("backend panicked: {}", panic_message(payload.as_ref())))?
            .map_err(|e| e.to_string())?;

        if reply.trim().is_empty() {
            return Err(BackendError::EmptyResponse.to_string());
        }
        Ok(reply)
    }

    fn provider_event(
        kind: EventKind,
        message: String,
        label: &str,
        position: usize,
        count: usize,
        descriptor: &BackendDescriptor,
    ) -> MonitoringEvent {
        MonitoringEvent::new(kind, message)
            .param("label", label)
            .param("provider_index", position)
            .param("provider_count", count)
            .param("backend", descriptor.kind().as_str())
            .param("model", descriptor.model())
    }
}

impl std::fmt::Debug for FallbackFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackFetcher")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::chain::BackendKind;
    use crate::monitoring::MemorySink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with a fixed result and counts calls.
    struct Stub {
        reply: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl Stub {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for Stub {
        async fn send(&self, _request: BackendRequest<'_>) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|m| BackendError::Request(m.to_string()))
        }
    }

    struct Panics;

    #[async_trait]
    impl Backend for Panics {
        async fn send(&self, _request: BackendRequest<'_>) -> Result<String, BackendError> {
            panic!("adapter bug");
        }
    }

    fn descriptor(kind: BackendKind) -> BackendDescriptor {
        match kind {
            BackendKind::Gemini => BackendDescriptor::Gemini {
                model: "gemini".into(),
                temperature: Some(0.7),
            },
            BackendKind::OpenAi => BackendDescriptor::OpenAi {
                model: "gpt".into(),
                temperature: None,
            },
            BackendKind::Anthropic => BackendDescriptor::Anthropic {
                model: "claude".into(),
                temperature: None,
                max_tokens: None,
            },
            BackendKind::Ollama => BackendDescriptor::Ollama {
                model: "llama".into(),
                temperature: None,
            },
        }
    }

    fn chain(kinds: &[BackendKind]) -> ProviderChainConfig {
        ProviderChainConfig::new(kinds.iter().copied().map(descriptor).collect())
            .with_label("test-chain")
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let first = Stub::ok("from first");
        let second = Stub::ok("from second");
        let sink = Arc::new(MemorySink::new());
        let fetcher = FallbackFetcher::new(
            BackendRegistry::new()
                .with_backend(BackendKind::Gemini, first.clone())
                .with_backend(BackendKind::OpenAi, second.clone()),
        )
        .with_sink(sink.clone());

        let reply = fetcher
            .fetch("prompt", &chain(&[BackendKind::Gemini, BackendKind::OpenAi]))
            .await;

        assert_eq!(reply.as_deref(), Some("from first"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn falls_back_and_reports_position() {
        let first = Stub::failing("503");
        let second = Stub::ok("hello");
        let sink = Arc::new(MemorySink::new());
        let fetcher = FallbackFetcher::new(
            BackendRegistry::new()
                .with_backend(BackendKind::Gemini, first.clone())
                .with_backend(BackendKind::OpenAi, second.clone()),
        )
        .with_sink(sink.clone());

        let reply = fetcher
            .fetch("prompt", &chain(&[BackendKind::Gemini, BackendKind::OpenAi]))
            .await;

        assert_eq!(reply.as_deref(), Some("hello"));

        let fallback = sink.of_kind(EventKind::FallbackUsed);
        assert_eq!(fallback.len(), 1);
        assert!(fallback[0].is_info_level);
        assert_eq!(fallback[0].params["provider_index"], 2);
        assert_eq!(fallback[0].params["provider_count"], 2);

        let failed = sink.of_kind(EventKind::ProviderFailed);
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn exhaustion_emits_one_event_per_provider_plus_summary() {
        let empty = Stub::ok("   ");
        let failing = Stub::failing("down");
        let sink = Arc::new(MemorySink::new());
        let fetcher = FallbackFetcher::new(
            BackendRegistry::new()
                .with_backend(BackendKind::Gemini, empty.clone())
                .with_backend(BackendKind::OpenAi, failing.clone()),
        )
        .with_sink(sink.clone());

        let reply = fetcher
            .fetch(
                "prompt",
                &chain(&[BackendKind::Gemini, BackendKind::OpenAi, BackendKind::Gemini]),
            )
            .await;

        assert!(reply.is_none());
        assert_eq!(empty.calls(), 2);
        assert_eq!(failing.calls(), 1);
        assert_eq!(sink.of_kind(EventKind::ProviderFailed).len(), 3);
        assert_eq!(sink.of_kind(EventKind::AllProvidersFailed).len(), 1);
        assert_eq!(sink.events().len(), 4);
    }

    #[tokio::test]
    async fn empty_chain_is_absent_without_calls() {
        let stub = Stub::ok("never");
        let sink = Arc::new(MemorySink::new());
        let fetcher =
            FallbackFetcher::new(BackendRegistry::new().with_backend(BackendKind::Gemini, stub.clone()))
                .with_sink(sink.clone());

        let reply = fetcher.fetch("prompt", &chain(&[])).await;

        assert!(reply.is_none());
        assert_eq!(stub.calls(), 0);
        assert_eq!(sink.of_kind(EventKind::EmptyChain).len(), 1);
        assert!(sink.of_kind(EventKind::AllProvidersFailed).is_empty());
    }

    #[tokio::test]
    async fn missing_adapter_counts_as_provider_failure() {
        let stub = Stub::ok("ok");
        let sink = Arc::new(MemorySink::new());
        let fetcher =
            FallbackFetcher::new(BackendRegistry::new().with_backend(BackendKind::OpenAi, stub.clone()))
                .with_sink(sink.clone());

        let reply = fetcher
            .fetch("prompt", &chain(&[BackendKind::Anthropic, BackendKind::OpenAi]))
            .await;

        assert_eq!(reply.as_deref(), Some("ok"));
        let failed = sink.of_kind(EventKind::ProviderFailed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].params["backend"], "anthropic");
    }

    #[tokio::test]
    async fn panicking_adapter_is_contained() {
        let stub = Stub::ok("recovered");
        let sink = Arc::new(MemorySink::new());
        let fetcher = FallbackFetcher::new(
            BackendRegistry::new()
                .with_backend(BackendKind::Ollama, Arc::new(Panics))
                .with_backend(BackendKind::Gemini, stub.clone()),
        )
        .with_sink(sink.clone());

        let reply = fetcher
            .fetch("prompt", &chain(&[BackendKind::Ollama, BackendKind::Gemini]))
            .await;

        assert_eq!(reply.as_deref(), Some("recovered"));
        let failed = sink.of_kind(EventKind::ProviderFailed);
        assert!(failed[0].error.as_deref().unwrap().contains("adapter bug"));
    }

    #[tokio::test]
    async fn schema_hint_is_forwarded() {
        struct HintCheck;

        #[async_trait]
        impl Backend for HintCheck {
            async fn send(&self, request: BackendRequest<'_>) -> Result<String, BackendError> {
                match request.schema_hint {
                    Some(schema) => Ok(schema["type"].to_string()),
                    None => Err(BackendError::Other("no hint".into())),
                }
            }
        }

        let schema = crate::schema::OutputSchema::new(serde_json::json!({"type": "object"})).unwrap();
        let fetcher = FallbackFetcher::new(
            BackendRegistry::new().with_backend(BackendKind::Gemini, Arc::new(HintCheck)),
        )
        .with_sink(Arc::new(MemorySink::new()));

        let reply = fetcher
            .fetch("prompt", &chain(&[BackendKind::Gemini]).with_schema(schema))
            .await;
        assert_eq!(reply.as_deref(), Some("\"object\""));
    }
}
