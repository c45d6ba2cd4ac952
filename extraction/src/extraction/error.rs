//! Attempt history and error types for structured extraction.

use serde::Serialize;
use thiserror::Error;

/// Which stage of an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptErrorKind {
    /// No backend produced any text.
    NoResponse,
    /// Text came back but was not JSON.
    JsonParse,
    /// JSON came back but violated the schema.
    SchemaValidation,
    /// Schema-valid, but rejected by the caller's validator.
    CustomValidation,
}

/// Record of one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptError {
    /// The attempt number (1-indexed).
    pub attempt: usize,
    /// Failing stage.
    pub kind: AttemptErrorKind,
    /// What went wrong.
    pub message: String,
    /// The reply text, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl AttemptError {
    pub(crate) fn no_response(attempt: usize) -> Self {
        Self {
            attempt,
            kind: AttemptErrorKind::NoResponse,
            message: "no backend returned a response".to_string(),
            raw: None,
        }
    }

    pub(crate) fn with_reply(
        attempt: usize,
        kind: AttemptErrorKind,
        message: impl Into<String>,
        raw: &str,
    ) -> Self {
        Self {
            attempt,
            kind,
            message: message.into(),
            raw: Some(raw.to_string()),
        }
    }
}

/// Why an extraction gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every attempt ended without any reply.
    NoResponse,
    /// At least one reply arrived but none passed validation.
    InvalidJson,
}

impl FailureReason {
    /// Classifies an attempt history: `NoResponse` only when every error is a
    /// missing reply.
    #[must_use]
    pub fn classify(errors: &[AttemptError]) -> Self {
        if errors
            .iter()
            .all(|error| error.kind == AttemptErrorKind::NoResponse)
        {
            Self::NoResponse
        } else {
            Self::InvalidJson
        }
    }
}

/// Errors that prevent an extraction from starting.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The chain carries no output schema.
    #[error("provider chain '{label}' has no output schema; structured extraction needs one")]
    MissingSchema {
        /// Label of the offending chain.
        label: String,
    },
}
