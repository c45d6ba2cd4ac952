//! Metrics tracking and token estimation for extraction operations.

use std::time::Duration;

/// Metrics collected during an extraction operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetrics {
    /// Total number of attempts made.
    pub total_attempts: usize,
    /// Wall-clock time elapsed during extraction.
    pub wall_time: Duration,
    /// Estimated tokens sent across all attempts.
    pub estimated_input_tokens: usize,
    /// Estimated tokens received across all attempts.
    pub estimated_output_tokens: usize,
}

/// Estimate token count from text using the standard 4-chars-per-token heuristic.
///
/// Counts chars, not bytes, and rounds up.
///
/// ```
/// use lingua_extraction::extraction::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);
/// assert_eq!(estimate_tokens("hello world"), 3);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
