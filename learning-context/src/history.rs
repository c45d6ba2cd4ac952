//! Exercise history: the records the sampler draws from and the source that
//! serves them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most recent completed exercises considered per lookup.
pub const HISTORY_LIMIT: usize = 100;

/// Errors from a history source.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The lookup itself failed.
    #[error("history lookup failed: {0}")]
    Lookup(String),

    /// The store could not be reached.
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// The language the learner knows and the one being learned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Language the learner already speaks.
    pub source: String,
    /// Language being learned.
    pub target: String,
}

impl LanguagePair {
    /// Creates a pair from language codes.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Whose history, in which languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryQuery {
    /// Learner id.
    pub user_id: String,
    /// Source and target language.
    pub languages: LanguagePair,
    /// Regional variant of the target language.
    pub dialect: Option<String>,
    /// Maximum records to return.
    pub limit: usize,
}

impl HistoryQuery {
    /// Query for the default [`HISTORY_LIMIT`] most recent exercises.
    #[must_use]
    pub fn new(user_id: impl Into<String>, languages: LanguagePair) -> Self {
        Self {
            user_id: user_id.into(),
            languages,
            dialect: None,
            limit: HISTORY_LIMIT,
        }
    }

    /// Restricts the query to a dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }
}

/// A completed exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    /// Exercise id; key for word-selection lookups.
    pub id: String,
    /// Sentence in the learner's language.
    pub source_sentence: String,
    /// Sentence in the target language.
    pub target_sentence: String,
    /// Grammar patterns recorded for the exercise.
    #[serde(default)]
    pub grammar_patterns: Vec<String>,
}

/// A word the learner tapped while working on an exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordSelection {
    /// Language code of the sentence the word was in.
    pub language: String,
    /// The selected word.
    pub word: String,
    /// Word index within its sentence.
    pub position: usize,
}

/// Where exercise history comes from.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Most recently completed exercises, newest first, at most `query.limit`.
    async fn recent_completed(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<ExerciseRecord>, HistoryError>;

    /// Word selections recorded for one exercise.
    async fn word_selections(&self, exercise_id: &str) -> Result<Vec<WordSelection>, HistoryError>;
}

/// History for a single learner held in memory.
///
/// Ignores everything in the query except `limit`. Counts selection lookups,
/// which makes it handy in tests.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    exercises: Vec<ExerciseRecord>,
    selections: HashMap<String, Vec<WordSelection>>,
    selection_lookups: AtomicUsize,
}

impl InMemoryHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an exercise (older than those already added) with its selections.
    #[must_use]
    pub fn with_exercise(mut self, exercise: ExerciseRecord, selections: Vec<WordSelection>) -> Self {
        if !selections.is_empty() {
            self.selections.insert(exercise.id.clone(), selections);
        }
        self.exercises.push(exercise);
        self
    }

    /// All exercises, newest first.
    #[must_use]
    pub fn exercises(&self) -> &[ExerciseRecord] {
        &self.exercises
    }

    /// How many times `word_selections` has been called.
    #[must_use]
    pub fn selection_lookups(&self) -> usize {
        self.selection_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HistorySource for InMemoryHistory {
    async fn recent_completed(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<ExerciseRecord>, HistoryError> {
        Ok(self.exercises.iter().take(query.limit).cloned().collect())
    }

    async fn word_selections(&self, exercise_id: &str) -> Result<Vec<WordSelection>, HistoryError> {
        self.selection_lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.selections.get(exercise_id).cloned().unwrap_or_default())
    }
}
