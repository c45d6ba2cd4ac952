//! The bounded repair loop behind structured extraction.

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::config::ExtractionConfig;
use super::error::{AttemptError, AttemptErrorKind, ExtractionError, FailureReason};
use super::feedback::{parse_reply, RepairContext};
use super::metrics::{estimate_tokens, ExtractionMetrics};
use crate::chain::ProviderChainConfig;
use crate::fetcher::FallbackFetcher;
use crate::monitoring::{EventKind, MonitoringEvent};
use crate::schema::{prettify_errors, OutputSchema};

/// Caller-supplied domain check; `Some(message)` rejects the value.
pub type CustomValidator<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// One extraction call: the prompt plus per-call overrides.
pub struct ExtractionRequest<T> {
    prompt: String,
    max_attempts: Option<usize>,
    repair_instructions: Option<String>,
    validator: Option<CustomValidator<T>>,
}

impl<T> ExtractionRequest<T> {
    /// Starts a request for `prompt`.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_attempts: None,
            repair_instructions: None,
            validator: None,
        }
    }

    /// Overrides the attempt budget for this call.
    #[must_use]
    pub fn max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = Some(max);
        self
    }

    /// Adds guidance appended to every repair prompt.
    #[must_use]
    pub fn repair_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.repair_instructions = Some(instructions.into());
        self
    }

    /// Adds a domain check run after schema validation.
    #[must_use]
    pub fn validate_with<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> Option<String> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    /// The original prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Terminal result of an extraction call.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome<T> {
    /// A reply passed every check.
    Success {
        /// The decoded value.
        data: T,
        /// The reply it was decoded from.
        raw_response: String,
        /// Attempt that succeeded (1-indexed).
        attempts: usize,
        /// Failures before the successful attempt.
        previous_errors: Vec<AttemptError>,
        /// Timing and token estimates.
        metrics: ExtractionMetrics,
    },
    /// The attempt budget ran out.
    Failure {
        /// Outage versus bad output.
        reason: FailureReason,
        /// Attempts spent.
        attempts: usize,
        /// Every failure, in order.
        errors: Vec<AttemptError>,
        /// Timing and token estimates.
        metrics: ExtractionMetrics,
    },
}

impl<T> ExtractionOutcome<T> {
    /// Whether a value was extracted.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Attempts spent.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }

    /// Failures recorded along the way.
    #[must_use]
    pub fn errors(&self) -> &[AttemptError] {
        match self {
            Self::Success {
                previous_errors, ..
            } => previous_errors,
            Self::Failure { errors, .. } => errors,
        }
    }

    /// Timing and token estimates.
    #[must_use]
    pub const fn metrics(&self) -> &ExtractionMetrics {
        match self {
            Self::Success { metrics, .. } | Self::Failure { metrics, .. } => metrics,
        }
    }

    /// The extracted value, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Consumes the outcome, keeping only the extracted value.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }
}

/// Turns prompts into schema-validated values, re-prompting with repair
/// instructions when a reply is missing or unusable.
#[derive(Debug, Clone)]
pub struct StructuredExtractor {
    fetcher: FallbackFetcher,
    config: ExtractionConfig,
}

impl StructuredExtractor {
    /// Creates an extractor with the default configuration.
    #[must_use]
    pub fn new(fetcher: FallbackFetcher) -> Self {
        Self {
            fetcher,
            config: ExtractionConfig::default(),
        }
    }

    /// Creates an extractor with the given configuration.
    #[must_use]
    pub const fn with_config(fetcher: FallbackFetcher, config: ExtractionConfig) -> Self {
        Self { fetcher, config }
    }

    /// The fetcher driving each attempt.
    #[must_use]
    pub const fn fetcher(&self) -> &FallbackFetcher {
        &self.fetcher
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Runs the extraction loop for `request` over `chain`.
    ///
    /// Only a chain without a schema is an error; every backend or output
    /// problem ends up in the returned [`ExtractionOutcome`].
    pub async fn extract<T>(
        &self,
        chain: &ProviderChainConfig,
        request: ExtractionRequest<T>,
    ) -> Result<ExtractionOutcome<T>, ExtractionError>
    where
        T: DeserializeOwned,
    {
        let Some(schema) = chain.schema.as_ref() else {
            return Err(ExtractionError::MissingSchema {
                label: chain.display_label().to_string(),
            });
        };

        let span = tracing::info_span!(
            "extract",
            call_id = %Uuid::new_v4(),
            label = chain.display_label()
        );
        Ok(self.run(chain, schema, &request).instrument(span).await)
    }

    async fn run<T>(
        &self,
        chain: &ProviderChainConfig,
        schema: &OutputSchema,
        request: &ExtractionRequest<T>,
    ) -> ExtractionOutcome<T>
    where
        T: DeserializeOwned,
    {
        let start = Instant::now();
        let mut errors: Vec<AttemptError> = Vec::new();
        let mut input_tokens: usize = 0;
        let mut output_tokens: usize = 0;

        if chain.providers.is_empty() {
            self.fetcher.report_empty_chain(chain);
            let metrics = ExtractionMetrics {
                wall_time: start.elapsed(),
                ..ExtractionMetrics::default()
            };
            return self.fail(chain, errors, metrics);
        }

        let max_attempts = request
            .max_attempts
            .unwrap_or(self.config.max_attempts)
            .max(1);
        let repair = RepairContext {
            original_prompt: &request.prompt,
            repair_instructions: request.repair_instructions.as_deref(),
            schema: self
                .config
                .include_schema_in_repair
                .then(|| schema.as_value()),
            excerpt_chars: self.config.raw_excerpt_chars,
        };
        let mut current_prompt = request.prompt.clone();

        for attempt in 1..=max_attempts {
            input_tokens += estimate_tokens(&current_prompt);

            let Some(reply) = self.fetcher.fetch(&current_prompt, chain).await else {
                tracing::debug!(target: "lingua", attempt, max_attempts, "No reply from any provider");
                errors.push(AttemptError::no_response(attempt));
                continue;
            };
            output_tokens += estimate_tokens(&reply);

            match check_reply(&reply, schema, request.validator.as_ref()) {
                Ok(data) => {
                    tracing::debug!(target: "lingua", attempt, "Extraction succeeded");
                    return ExtractionOutcome::Success {
                        data,
                        raw_response: reply,
                        attempts: attempt,
                        previous_errors: errors,
                        metrics: ExtractionMetrics {
                            total_attempts: attempt,
                            wall_time: start.elapsed(),
                            estimated_input_tokens: input_tokens,
                            estimated_output_tokens: output_tokens,
                        },
                    };
                }
                Err((kind, message)) => {
                    tracing::debug!(target: "lingua", attempt, max_attempts, ?kind, %message, "Reply rejected");
                    current_prompt = repair.build(&reply, &message);
                    errors.push(AttemptError::with_reply(attempt, kind, message, &reply));
                }
            }
        }

        let metrics = ExtractionMetrics {
            total_attempts: errors.len(),
            wall_time: start.elapsed(),
            estimated_input_tokens: input_tokens,
            estimated_output_tokens: output_tokens,
        };
        self.fail(chain, errors, metrics)
    }

    fn fail<T>(
        &self,
        chain: &ProviderChainConfig,
        errors: Vec<AttemptError>,
        metrics: ExtractionMetrics,
    ) -> ExtractionOutcome<T> {
        let reason = FailureReason::classify(&errors);
        let attempts = errors.len();

        self.fetcher.sink().record(
            MonitoringEvent::new(
                EventKind::ExtractionFailed,
                format!("Structured extraction failed after {attempts} attempts"),
            )
            .param("label", chain.display_label())
            .param("attempts", attempts)
            .param("reason", serde_json::to_value(reason).unwrap_or_default())
            .param("errors", serde_json::to_value(&errors).unwrap_or_default()),
        );

        ExtractionOutcome::Failure {
            reason,
            attempts,
            errors,
            metrics,
        }
    }
}

/// Parse, schema-check and domain-check one reply.
fn check_reply<T>(
    reply: &str,
    schema: &OutputSchema,
    validator: Option<&CustomValidator<T>>,
) -> Result<T, (AttemptErrorKind, String)>
where
    T: DeserializeOwned,
{
    let value = parse_reply(reply).map_err(|e| (AttemptErrorKind::JsonParse, e.to_string()))?;

    let data: T = schema
        .validate_typed(&value)
        .map_err(|errors| (AttemptErrorKind::SchemaValidation, prettify_errors(&errors)))?;

    if let Some(problem) = validator
        .and_then(|check| check(&data))
        .filter(|message| !message.trim().is_empty())
    {
        return Err((AttemptErrorKind::CustomValidation, problem));
    }

    Ok(data)
}
