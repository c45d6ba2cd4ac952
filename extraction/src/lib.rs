//! Resilient structured-output client.
//!
//! Turns a text prompt into a schema-validated value by calling one of several
//! interchangeable text-generation backends:
//!
//! - [`chain`] - per-feature provider chains and the registry holding them
//! - [`backend`] - the adapter contract and the kind-to-adapter lookup table
//! - [`fetcher`] - ordered fallback across a chain until one backend replies
//! - [`extraction`] - the parse / validate / repair retry loop
//! - [`monitoring`] - structured diagnostic events
//! - [`schema`] - compiled JSON Schemas with typed decoding

pub mod backend;
pub mod chain;
pub mod extraction;
pub mod fetcher;
pub mod monitoring;
pub mod schema;

pub use backend::{Backend, BackendError, BackendRegistry, BackendRequest};
pub use chain::{BackendDescriptor, BackendKind, ChainRegistry, ConfigError, ProviderChainConfig};
pub use extraction::{
    AttemptError, AttemptErrorKind, ExtractionConfig, ExtractionError, ExtractionMetrics,
    ExtractionOutcome, ExtractionRequest, FailureReason, StructuredExtractor,
};
pub use fetcher::FallbackFetcher;
pub use monitoring::{EventKind, MemorySink, MonitoringEvent, MonitoringSink, TracingSink};
pub use schema::{OutputSchema, SchemaError};

/// Common types for wiring chains, backends and extraction calls.
pub mod prelude {
    pub use crate::backend::{Backend, BackendError, BackendRegistry, BackendRequest};
    pub use crate::chain::{BackendDescriptor, BackendKind, ChainRegistry, ProviderChainConfig};
    pub use crate::extraction::{
        AttemptError, AttemptErrorKind, ExtractionConfig, ExtractionError, ExtractionOutcome,
        ExtractionRequest, FailureReason, StructuredExtractor,
    };
    pub use crate::fetcher::FallbackFetcher;
    pub use crate::monitoring::{EventKind, MemorySink, MonitoringEvent, MonitoringSink};
    pub use crate::schema::OutputSchema;
}
