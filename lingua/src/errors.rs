//! Public error types for lingua.

use lingua_extraction::{ConfigError, ExtractionError};
use lingua_learning_context::HistoryError;
use thiserror::Error;

/// Errors surfaced by [`Client`](crate::Client).
///
/// Backend outages and unusable replies are not errors; they are reported in
/// the returned outcome. These variants cover misconfiguration and history
/// lookups.
#[derive(Debug, Error)]
pub enum Error {
    /// No chain is registered under the requested feature name.
    #[error("No provider chain configured for feature '{0}'")]
    UnknownFeature(String),

    /// The chain registry could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The chain cannot be used for structured extraction.
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    /// Exercise history could not be read.
    #[error("{0}")]
    History(#[from] HistoryError),
}
