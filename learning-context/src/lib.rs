//! Learning-context sampling.
//!
//! Picks one previously completed exercise, with its difficult words and
//! grammar patterns, to enrich the prompt for a new exercise.
//!
//! ```no_run
//! # use lingua_learning_context::*;
//! # use rand::SeedableRng;
//! # async fn example(history: &dyn HistorySource) -> Result<(), HistoryError> {
//! let query = HistoryQuery::new("learner-42", LanguagePair::new("en", "es"));
//! let mut rng = rand::rngs::StdRng::from_entropy();
//!
//! if let Some(candidate) = LearningContextSampler::new()
//!     .sample_for(&query, history, &mut rng)
//!     .await?
//! {
//!     let section = ContextHints::from_candidate(&candidate).render(&query.languages);
//!     println!("{section}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod candidate;
pub mod hints;
pub mod history;
pub mod sampler;

pub use candidate::{LearningContextCandidate, SelectionChunks};
pub use hints::{ContextHints, MAX_HINT_PATTERNS, MAX_HINT_WORDS};
pub use history::{
    ExerciseRecord, HistoryError, HistoryQuery, HistorySource, InMemoryHistory, LanguagePair,
    WordSelection, HISTORY_LIMIT,
};
pub use sampler::{LearningContextSampler, DEFAULT_POOL_SIZE};
