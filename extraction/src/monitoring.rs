//! Structured diagnostic events emitted by the fetcher and extractor.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde_json::{Map, Value};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// One backend failed or returned nothing.
    ProviderFailed,
    /// A backend other than the first produced the reply.
    FallbackUsed,
    /// Every backend in the chain failed.
    AllProvidersFailed,
    /// The chain has no backends at all.
    EmptyChain,
    /// Structured extraction ran out of attempts.
    ExtractionFailed,
}

/// A structured diagnostic event.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringEvent {
    /// Event category.
    pub kind: EventKind,
    /// Human-readable summary.
    pub message: String,
    /// Structured context (label, indices, attempts, ...).
    pub params: Map<String, Value>,
    /// Error text, when the event reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational rather than a failure.
    pub is_info_level: bool,
}

impl MonitoringEvent {
    /// Creates a failure-level event with no params.
    #[must_use]
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            params: Map::new(),
            error: None,
            is_info_level: false,
        }
    }

    /// Adds a param.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Attaches error text.
    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Marks the event informational.
    #[must_use]
    pub const fn info(mut self) -> Self {
        self.is_info_level = true;
        self
    }
}

/// Receiver for diagnostic events.
pub trait MonitoringSink: Send + Sync {
    /// Records one event. Must not block for long; called inline.
    fn record(&self, event: MonitoringEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MonitoringSink for TracingSink {
    fn record(&self, event: MonitoringEvent) {
        let params = Value::Object(event.params);
        let error = event.error.as_deref().unwrap_or("");

        if event.is_info_level {
            tracing::info!(target: "lingua", kind = ?event.kind, %params, "{}", event.message);
            return;
        }

        match event.kind {
            EventKind::AllProvidersFailed | EventKind::EmptyChain | EventKind::ExtractionFailed => {
                tracing::error!(target: "lingua", kind = ?event.kind, %params, error, "{}", event.message);
            }
            EventKind::ProviderFailed | EventKind::FallbackUsed => {
                tracing::warn!(target: "lingua", kind = ?event.kind, %params, error, "{}", event.message);
            }
        }
    }
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MonitoringEvent>>,
}

impl MemorySink {
    /// Returns an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<MonitoringEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<MonitoringEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }
}

impl MonitoringSink for MemorySink {
    fn record(&self, event: MonitoringEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
