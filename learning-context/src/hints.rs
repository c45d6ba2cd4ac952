//! Prompt-side view of a sampled context, trimmed to what a prompt can use.

use std::collections::HashSet;
use std::fmt::Write;

use crate::candidate::LearningContextCandidate;
use crate::history::LanguagePair;

/// Most distinct words surfaced per language.
pub const MAX_HINT_WORDS: usize = 10;
/// Most grammar patterns surfaced.
pub const MAX_HINT_PATTERNS: usize = 10;

/// Words and patterns worth revisiting, de-duplicated and capped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextHints {
    /// Sentence in the learner's language.
    pub source_sentence: String,
    /// Sentence in the target language.
    pub target_sentence: String,
    /// Selected words in the learner's language.
    pub source_words: Vec<String>,
    /// Selected words in the target language.
    pub target_words: Vec<String>,
    /// Grammar patterns of the exercise.
    pub grammar_patterns: Vec<String>,
}

impl ContextHints {
    /// Builds hints from a sampled candidate.
    #[must_use]
    pub fn from_candidate(candidate: &LearningContextCandidate) -> Self {
        Self {
            source_sentence: candidate.exercise.source_sentence.clone(),
            target_sentence: candidate.exercise.target_sentence.clone(),
            source_words: distinct(
                candidate.source_selections.tokens().iter().map(String::as_str),
                MAX_HINT_WORDS,
            ),
            target_words: distinct(
                candidate.target_selections.tokens().iter().map(String::as_str),
                MAX_HINT_WORDS,
            ),
            grammar_patterns: distinct(
                candidate.grammar_patterns().iter().map(String::as_str),
                MAX_HINT_PATTERNS,
            ),
        }
    }

    /// Whether there is nothing beyond the sentence pair.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source_words.is_empty() && self.target_words.is_empty() && self.grammar_patterns.is_empty()
    }

    /// Renders a prompt section describing the context.
    #[must_use]
    pub fn render(&self, languages: &LanguagePair) -> String {
        let mut out = String::from("Learning context from a previous exercise:\n");
        let _ = writeln!(out, "- Sentence ({}): {}", languages.source, self.source_sentence);
        let _ = writeln!(out, "- Sentence ({}): {}", languages.target, self.target_sentence);

        if !self.target_words.is_empty() {
            let _ = writeln!(
                out,
                "- Words the learner looked up ({}): {}",
                languages.target,
                self.target_words.join(", ")
            );
        }
        if !self.source_words.is_empty() {
            let _ = writeln!(
                out,
                "- Words the learner looked up ({}): {}",
                languages.source,
                self.source_words.join(", ")
            );
        }
        if !self.grammar_patterns.is_empty() {
            let _ = writeln!(out, "- Grammar patterns: {}", self.grammar_patterns.join(", "));
        }

        out
    }
}

/// First occurrences, compared case-insensitively, at most `limit` of them.
fn distinct<'a>(items: impl Iterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .take(limit)
        .map(str::to_string)
        .collect()
}
