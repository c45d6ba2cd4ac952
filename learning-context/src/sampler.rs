//! Two-stage random selection of a learning context.
//!
//! Stage one shuffles the history and keeps a bounded pool; stage two picks
//! one pool member uniformly among those with learning data. Both stages are
//! unweighted, so identical inputs may yield different picks.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::candidate::LearningContextCandidate;
use crate::history::{ExerciseRecord, HistoryError, HistoryQuery, HistorySource, LanguagePair};

/// Pool size for the breadth stage.
pub const DEFAULT_POOL_SIZE: usize = 30;

/// Picks at most one past exercise to seed a generation prompt.
#[derive(Debug, Clone, Copy)]
pub struct LearningContextSampler {
    pool_size: usize,
}

impl Default for LearningContextSampler {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl LearningContextSampler {
    /// Sampler with the default pool size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the pool size; zero is treated as one.
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// The configured pool size.
    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Fetches the learner's recent history and samples from it.
    pub async fn sample_for<R>(
        &self,
        query: &HistoryQuery,
        source: &dyn HistorySource,
        rng: &mut R,
    ) -> Result<Option<LearningContextCandidate>, HistoryError>
    where
        R: Rng,
    {
        let mut history = source.recent_completed(query).await?;
        history.truncate(query.limit);
        self.sample(history, &query.languages, source, rng).await
    }

    /// Samples one candidate with learning data from `history`.
    ///
    /// Word selections are fetched for every pool member, one at a time.
    pub async fn sample<R>(
        &self,
        mut history: Vec<ExerciseRecord>,
        languages: &LanguagePair,
        source: &dyn HistorySource,
        rng: &mut R,
    ) -> Result<Option<LearningContextCandidate>, HistoryError>
    where
        R: Rng,
    {
        if history.is_empty() {
            return Ok(None);
        }

        history.shuffle(rng);
        history.truncate(self.pool_size);
        let pool_size = history.len();

        let mut eligible = Vec::with_capacity(pool_size);
        for exercise in history {
            let selections = source.word_selections(&exercise.id).await?;
            let candidate = LearningContextCandidate::new(exercise, &selections, languages);
            if candidate.has_learning_data() {
                eligible.push(candidate);
            }
        }

        if eligible.is_empty() {
            tracing::debug!(pool_size, "No pool member has learning data");
            return Ok(None);
        }

        let eligible_count = eligible.len();
        let chosen = eligible.swap_remove(rng.gen_range(0..eligible_count));
        tracing::debug!(
            pool_size,
            eligible = eligible_count,
            exercise_id = %chosen.exercise.id,
            "Sampled learning context"
        );
        Ok(Some(chosen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{InMemoryHistory, WordSelection};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn languages() -> LanguagePair {
        LanguagePair::new("en", "es")
    }

    fn exercise(id: usize, patterns: &[&str]) -> ExerciseRecord {
        ExerciseRecord {
            id: format!("ex-{id}"),
            source_sentence: format!("sentence {id}"),
            target_sentence: format!("frase {id}"),
            grammar_patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    fn selection(language: &str, word: &str, position: usize) -> WordSelection {
        WordSelection {
            language: language.into(),
            word: word.into(),
            position,
        }
    }

    /// 100 exercises; every 7th has patterns, every 11th has selections.
    fn mixed_history() -> InMemoryHistory {
        (0..100).fold(InMemoryHistory::new(), |history, i| {
            let patterns: &[&str] = if i % 7 == 0 { &["ser vs estar"] } else { &[] };
            let selections = if i % 11 == 0 {
                vec![
                    selection("es", "biblioteca", 3),
                    selection("en", "library", 2),
                    selection("es", "cerrada", 4),
                ]
            } else {
                Vec::new()
            };
            history.with_exercise(exercise(i, patterns), selections)
        })
    }

    #[tokio::test]
    async fn empty_history_yields_nothing() {
        let source = InMemoryHistory::new();
        let mut rng = StdRng::seed_from_u64(1);

        let result = LearningContextSampler::new()
            .sample(Vec::new(), &languages(), &source, &mut rng)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(source.selection_lookups(), 0);
    }

    #[tokio::test]
    async fn history_without_learning_data_yields_nothing() {
        let source = (0..40).fold(InMemoryHistory::new(), |h, i| {
            h.with_exercise(exercise(i, &[]), Vec::new())
        });

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = LearningContextSampler::new()
                .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
                .await
                .unwrap();
            assert!(result.is_none());
        }
    }

    #[tokio::test]
    async fn chosen_candidate_always_has_learning_data() {
        let source = mixed_history();
        let sampler = LearningContextSampler::new();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let before = source.selection_lookups();

            let result = sampler
                .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
                .await
                .unwrap();

            assert!(source.selection_lookups() - before <= DEFAULT_POOL_SIZE);
            if let Some(candidate) = result {
                assert!(candidate.has_learning_data());
                assert_eq!(
                    candidate.source_selections.tokens().len(),
                    candidate.source_selections.positions().len()
                );
                assert_eq!(
                    candidate.target_selections.tokens().len(),
                    candidate.target_selections.positions().len()
                );
            }
        }
    }

    #[tokio::test]
    async fn dialect_tagged_selection_counts_as_learning_data() {
        let source = InMemoryHistory::new()
            .with_exercise(exercise(1, &[]), vec![selection("es-MX", "ahorita", 0)]);
        let mut rng = StdRng::seed_from_u64(4);

        let candidate = LearningContextSampler::new()
            .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
            .await
            .unwrap()
            .expect("a recorded selection is learning data");

        assert!(candidate.has_learning_data());
        assert_eq!(candidate.target_selections.tokens(), ["ahorita"]);
        assert_eq!(candidate.target_selections.positions(), [0]);
        assert!(candidate.source_selections.is_empty());
    }

    #[tokio::test]
    async fn pool_is_capped() {
        let source = mixed_history();
        let mut rng = StdRng::seed_from_u64(7);

        LearningContextSampler::new()
            .with_pool_size(10)
            .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
            .await
            .unwrap();

        assert_eq!(source.selection_lookups(), 10);
    }

    #[tokio::test]
    async fn small_history_is_fully_considered() {
        let source = InMemoryHistory::new()
            .with_exercise(exercise(1, &[]), Vec::new())
            .with_exercise(
                exercise(2, &["subjuntivo"]),
                vec![selection("es", "quiera", 2), selection("en", "want", 1)],
            )
            .with_exercise(exercise(3, &[]), Vec::new());

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let candidate = LearningContextSampler::new()
                .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
                .await
                .unwrap()
                .unwrap();

            assert_eq!(candidate.exercise.id, "ex-2");
            assert_eq!(candidate.grammar_patterns(), ["subjuntivo"]);
            assert_eq!(candidate.target_selections.tokens(), ["quiera"]);
            assert_eq!(candidate.source_selections.tokens(), ["want"]);
        }
    }

    #[tokio::test]
    async fn every_eligible_member_can_be_picked() {
        let source = (0..3).fold(InMemoryHistory::new(), |h, i| {
            h.with_exercise(exercise(i, &["pretérito"]), Vec::new())
        });

        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let candidate = LearningContextSampler::new()
                .sample(source.exercises().to_vec(), &languages(), &source, &mut rng)
                .await
                .unwrap()
                .unwrap();
            seen.insert(candidate.exercise.id);
        }
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn sample_for_uses_query_limit() {
        let source = mixed_history();
        let mut query = HistoryQuery::new("learner", languages()).with_dialect("es-MX");
        query.limit = 5;
        let mut rng = StdRng::seed_from_u64(3);

        LearningContextSampler::new()
            .sample_for(&query, &source, &mut rng)
            .await
            .unwrap();

        assert_eq!(source.selection_lookups(), 5);
    }

    struct Broken;

    #[async_trait]
    impl HistorySource for Broken {
        async fn recent_completed(
            &self,
            _query: &HistoryQuery,
        ) -> Result<Vec<ExerciseRecord>, HistoryError> {
            Ok(vec![exercise(1, &[])])
        }

        async fn word_selections(&self, _id: &str) -> Result<Vec<WordSelection>, HistoryError> {
            Err(HistoryError::Unavailable("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn lookup_failures_propagate() {
        let mut rng = StdRng::seed_from_u64(0);
        let query = HistoryQuery::new("learner", languages());

        let result = LearningContextSampler::new()
            .sample_for(&query, &Broken, &mut rng)
            .await;

        assert!(matches!(result, Err(HistoryError::Unavailable(_))));
    }
}
