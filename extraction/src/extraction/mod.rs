//! Structured extraction: a bounded retry loop that parses, schema-checks and
//! domain-checks backend replies, re-prompting with repair instructions.
//!
//! - [`StructuredExtractor`] - the retry loop
//! - [`ExtractionRequest`] - prompt plus per-call overrides
//! - [`ExtractionOutcome`] - success or failure with the full attempt history
//! - [`AttemptError`] - one failed attempt
//! - [`ExtractionMetrics`] - timing and token estimates
//! - [`ExtractionConfig`] - retry defaults

pub mod config;
pub mod error;
pub mod feedback;
pub mod metrics;
pub mod orchestrator;

pub use config::ExtractionConfig;
pub use error::{AttemptError, AttemptErrorKind, ExtractionError, FailureReason};
pub use feedback::{parse_reply, RepairContext, REPAIR_INSTRUCTION};
pub use metrics::{estimate_tokens, ExtractionMetrics};
pub use orchestrator::{CustomValidator, ExtractionOutcome, ExtractionRequest, StructuredExtractor};
