use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lingua::prelude::*;
use lingua_learning_context::InMemoryHistory;
use rand::rngs::StdRng;
use rand::SeedableRng;
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
struct TranslationExercise {
    sentence: String,
    translation: String,
    focus_words: Vec<String>,
}

/// Always fails.
struct Down;

#[async_trait]
impl Backend for Down {
    async fn send(&self, _request: BackendRequest<'_>) -> Result<String, BackendError> {
        Err(BackendError::Timeout)
    }
}

/// Returns a fixed reply and remembers each prompt.
struct Fixed {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl Fixed {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Backend for Fixed {
    async fn send(&self, request: BackendRequest<'_>) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn chains() -> ChainRegistry {
    ChainRegistry::new()
        .with_chain(
            "translation",
            ProviderChainConfig::new(vec![
                BackendDescriptor::Gemini {
                    model: "gemini-2.0-flash".into(),
                    temperature: Some(0.7),
                },
                BackendDescriptor::OpenAi {
                    model: "gpt-4o-mini".into(),
                    temperature: None,
                },
            ])
            .with_schema(OutputSchema::for_type::<TranslationExercise>().unwrap())
            .with_label("translation"),
        )
        .with_chain(
            "chat",
            ProviderChainConfig::new(vec![BackendDescriptor::OpenAi {
                model: "gpt-4o-mini".into(),
                temperature: None,
            }]),
        )
}

fn history() -> InMemoryHistory {
    InMemoryHistory::new().with_exercise(
        ExerciseRecord {
            id: "ex-1".into(),
            source_sentence: "The library is closed.".into(),
            target_sentence: "La biblioteca está cerrada.".into(),
            grammar_patterns: vec!["estar + participle".into()],
        },
        vec![WordSelection {
            language: "es".into(),
            word: "cerrada".into(),
            position: 3,
        }],
    )
}

#[tokio::test]
async fn generates_exercise_from_sampled_context_via_fallback() {
    let openai = Fixed::new(
        r#"```json
{"sentence": "The door is closed.", "translation": "La puerta está cerrada.", "focus_words": ["cerrada"]}
```"#,
    );
    let sink = Arc::new(MemorySink::new());
    let client = Client::builder()
        .chains(chains())
        .backend(BackendKind::Gemini, Arc::new(Down))
        .backend(BackendKind::OpenAi, openai.clone())
        .sink(sink.clone())
        .build();

    let query = HistoryQuery::new("learner-1", LanguagePair::new("en", "es"));
    let mut rng = StdRng::seed_from_u64(11);
    let candidate = client
        .learning_context(&query, &history(), &mut rng)
        .await
        .unwrap()
        .expect("the only exercise has learning data");

    let hints = ContextHints::from_candidate(&candidate);
    let prompt = format!(
        "Create a new translation exercise.\n\n{}",
        hints.render(&query.languages)
    );

    let outcome = client
        .extract::<TranslationExercise>("translation", ExtractionRequest::new(prompt))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(outcome.data().unwrap().focus_words, vec!["cerrada"]);

    let sent = openai.prompts.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("cerrada"));
    assert!(sent[0].contains("estar + participle"));

    assert_eq!(sink.of_kind(EventKind::ProviderFailed).len(), 1);
    assert_eq!(sink.of_kind(EventKind::FallbackUsed).len(), 1);
}

#[tokio::test]
async fn plain_fetch_needs_no_schema() {
    let client = Client::builder()
        .chains(chains())
        .backend(BackendKind::OpenAi, Fixed::new("¡Hola!"))
        .build();

    let reply = client.fetch("chat", "Say hello in Spanish").await.unwrap();
    assert_eq!(reply.as_deref(), Some("¡Hola!"));
}

#[tokio::test]
async fn exhausted_chain_is_an_outcome_not_an_error() {
    let sink = Arc::new(MemorySink::new());
    let client = Client::builder()
        .chains(chains())
        .backend(BackendKind::Gemini, Arc::new(Down))
        .backend(BackendKind::OpenAi, Arc::new(Down))
        .sink(sink.clone())
        .config(ClientConfig::new().with_extraction(ExtractionConfig::default().with_max_attempts(2)))
        .build();

    let outcome = client
        .extract::<TranslationExercise>("translation", ExtractionRequest::new("Create an exercise"))
        .await
        .unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts(), 2);
    assert!(outcome
        .errors()
        .iter()
        .all(|e| e.kind == AttemptErrorKind::NoResponse));
    assert_eq!(sink.of_kind(EventKind::AllProvidersFailed).len(), 2);
    assert_eq!(sink.of_kind(EventKind::ExtractionFailed).len(), 1);
}

#[tokio::test]
async fn unknown_feature_is_reported_by_name() {
    let client = Client::builder().chains(chains()).build();

    let result = client
        .extract::<TranslationExercise>("listening", ExtractionRequest::new("x"))
        .await;

    assert!(matches!(result, Err(Error::UnknownFeature(f)) if f == "listening"));
}
