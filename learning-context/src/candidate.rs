//! The sampled exercise and its word selections split by language.

use serde::Serialize;

use crate::history::{ExerciseRecord, LanguagePair, WordSelection};

/// Selected words for one language as parallel token and position lists.
///
/// Both lists always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionChunks {
    tokens: Vec<String>,
    positions: Vec<usize>,
}

impl SelectionChunks {
    /// Appends one selected word.
    pub fn push(&mut self, token: impl Into<String>, position: usize) {
        self.tokens.push(token.into());
        self.positions.push(position);
    }

    /// Selected words, in recording order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Sentence positions, parallel to [`Self::tokens`].
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Number of selections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `(token, position)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tokens
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
    }
}

/// A past exercise chosen to enrich a generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearningContextCandidate {
    /// The exercise, grammar patterns included as recorded.
    pub exercise: ExerciseRecord,
    /// Words selected in the learner's language.
    pub source_selections: SelectionChunks,
    /// Words selected in the target language.
    pub target_selections: SelectionChunks,
}

impl LearningContextCandidate {
    /// Splits `selections` by language: those in the learner's language go
    /// to `source_selections`, every other one to `target_selections`.
    #[must_use]
    pub fn new(
        exercise: ExerciseRecord,
        selections: &[WordSelection],
        languages: &LanguagePair,
    ) -> Self {
        let mut source_selections = SelectionChunks::default();
        let mut target_selections = SelectionChunks::default();

        for selection in selections {
            if selection.language.eq_ignore_ascii_case(&languages.source) {
                source_selections.push(selection.word.clone(), selection.position);
            } else {
                if !selection.language.eq_ignore_ascii_case(&languages.target) {
                    tracing::debug!(
                        exercise_id = %exercise.id,
                        language = %selection.language,
                        "Filing selection outside the language pair under the target language"
                    );
                }
                target_selections.push(selection.word.clone(), selection.position);
            }
        }

        Self {
            exercise,
            source_selections,
            target_selections,
        }
    }

    /// Grammar patterns recorded for the exercise.
    #[must_use]
    pub fn grammar_patterns(&self) -> &[String] {
        &self.exercise.grammar_patterns
    }

    /// Whether there is anything to learn from: a grammar pattern or any
    /// recorded word selection.
    #[must_use]
    pub fn has_learning_data(&self) -> bool {
        !self.exercise.grammar_patterns.is_empty()
            || !self.source_selections.is_empty()
            || !self.target_selections.is_empty()
    }
}
