//! Configuration for extraction retry behavior.

/// Configuration for extraction retry behavior.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Attempts per call when the request does not override it (default: 3).
    pub max_attempts: usize,
    /// Longest excerpt of an invalid reply quoted back in a repair prompt (default: 2000 chars).
    pub raw_excerpt_chars: usize,
    /// Whether repair prompts restate the full output schema (default: false).
    pub include_schema_in_repair: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            raw_excerpt_chars: 2000,
            include_schema_in_repair: false,
        }
    }
}

impl ExtractionConfig {
    /// Set the default number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the longest quoted excerpt of an invalid reply.
    #[must_use]
    pub const fn with_raw_excerpt_chars(mut self, chars: usize) -> Self {
        self.raw_excerpt_chars = chars;
        self
    }

    /// Set whether repair prompts restate the schema.
    #[must_use]
    pub const fn with_schema_in_repair(mut self, include: bool) -> Self {
        self.include_schema_in_repair = include;
        self
    }
}
