//! End-to-end pipeline tests against fake collaborators.
//!
//! Every external call (chat, embedding, search, cross-encoder) is
//! substituted with a scripted fake carrying call counters, so stage
//! ordering and halt-on-failure behavior can be asserted exactly.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use lexrag::activity::ActivityLogger;
use lexrag::config::AppConfig;
use lexrag::embeddings::EmbeddingModel;
use lexrag::errors::LexRagError;
use lexrag::llm::prompts;
use lexrag::llm::ChatModel;
use lexrag::llm::ChatOptions;
use lexrag::models::Embedding;
use lexrag::models::EmbeddingMetadata;
use lexrag::models::RetrievalHit;
use lexrag::pipeline::CrossEncoder;
use lexrag::pipeline::RagPipeline;
use lexrag::search::SearchBackend;
use lexrag::Result;

const REWRITTEN_QUESTION: &str = "What does the liability clause of the discussed contract say?";
const HYPOTHETICAL_ANSWER: &str = "The liability clause caps damages at the contract value.";

/// Chat fake dispatching on the stage system prompt, with per-stage call
/// counters. A `None` script makes that stage's call fail upstream.
#[derive(Default)]
struct ScriptedChat {
    guardrail: Option<String>,
    rewriter: Option<String>,
    hyde: Option<String>,
    generator: Option<String>,
    guardrail_calls: AtomicUsize,
    rewriter_calls: AtomicUsize,
    hyde_calls: AtomicUsize,
    generator_calls: AtomicUsize,
}

impl ScriptedChat {
    fn happy_path() -> Self {
        Self {
            guardrail: Some(r#"{"isSafe": true}"#.to_string()),
            rewriter: Some(format!(
                r#"{{"neededRewrite": true, "rewrittenQuestion": "{REWRITTEN_QUESTION}"}}"#
            )),
            hyde: Some(format!(r#"{{"hypotheticalAnswer": "{HYPOTHETICAL_ANSWER}"}}"#)),
            generator: Some("A grounded answer, citing chunk 1.".to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(
        &self,
        system_prompt: &str,
        _user_message: &str,
        _options: &ChatOptions,
    ) -> Result<String> {
        let (script, counter) = if system_prompt == prompts::GUARDRAIL_SYSTEM_PROMPT {
            (&self.guardrail, &self.guardrail_calls)
        } else if system_prompt == prompts::REWRITER_SYSTEM_PROMPT {
            (&self.rewriter, &self.rewriter_calls)
        } else if system_prompt == prompts::HYDE_SYSTEM_PROMPT {
            (&self.hyde, &self.hyde_calls)
        } else if system_prompt == prompts::GENERATOR_SYSTEM_PROMPT {
            (&self.generator, &self.generator_calls)
        } else {
            panic!("unexpected system prompt");
        };

        counter.fetch_add(1, Ordering::SeqCst);
        script
            .clone()
            .ok_or_else(|| LexRagError::ChatModel("scripted failure".to_string()))
    }
}

/// Embedder tagging the vector so the search fake can tell which logical
/// query it serves: 1.0 for the rewritten question, 2.0 for the
/// hypothetical answer.
struct TaggingEmbedder {
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl TaggingEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            texts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EmbeddingModel for TaggingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        let tag = if text == REWRITTEN_QUESTION { 1.0 } else { 2.0 };
        Ok(Embedding {
            text: text.to_string(),
            vector: vec![tag, 0.0, 0.0],
            metadata: EmbeddingMetadata {
                model: "fake-embedder".to_string(),
                dimension: 3,
                created_at: Utc::now(),
            },
        })
    }
}

fn hit(id: &str, score: f32) -> RetrievalHit {
    RetrievalHit {
        index: "documents_index".to_string(),
        id: id.to_string(),
        score,
        source: HashMap::from([
            ("doc_title".to_string(), json!(format!("Title {id}"))),
            ("content".to_string(), json!(format!("content of {id}"))),
        ]),
    }
}

/// Search fake keyed on the embedder's vector tag
struct ScriptedSearch {
    calls: AtomicUsize,
}

impl ScriptedSearch {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchBackend for ScriptedSearch {
    async fn similarity_search(
        &self,
        _index: &str,
        query_vector: &[f32],
        _top_k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if (query_vector[0] - 1.0).abs() < f32::EPSILON {
            Ok(vec![hit("d1", 0.9), hit("d2", 0.8)])
        } else {
            Ok(vec![hit("d2", 0.95), hit("d3", 0.7)])
        }
    }

    async fn exists(&self, _index: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Cross-encoder fake scoring by document id
struct ScriptedEncoder {
    calls: AtomicUsize,
}

impl ScriptedEncoder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CrossEncoder for ScriptedEncoder {
    async fn score(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| match text.as_str() {
                "content of d1" => 0.9,
                "content of d3" => 0.5,
                _ => 0.1,
            })
            .collect())
    }
}

struct Fakes {
    chat: Arc<ScriptedChat>,
    embedder: Arc<TaggingEmbedder>,
    search: Arc<ScriptedSearch>,
    encoder: Arc<ScriptedEncoder>,
}

fn build_pipeline(chat: ScriptedChat, config: &AppConfig) -> (RagPipeline, Fakes) {
    let fakes = Fakes {
        chat: Arc::new(chat),
        embedder: Arc::new(TaggingEmbedder::new()),
        search: Arc::new(ScriptedSearch::new()),
        encoder: Arc::new(ScriptedEncoder::new()),
    };
    let pipeline = RagPipeline::from_parts(
        Arc::clone(&fakes.chat) as Arc<dyn ChatModel>,
        Arc::clone(&fakes.embedder) as Arc<dyn EmbeddingModel>,
        Arc::clone(&fakes.search) as Arc<dyn SearchBackend>,
        Arc::clone(&fakes.encoder) as Arc<dyn CrossEncoder>,
        ActivityLogger::disabled("test"),
        config,
    );
    (pipeline, fakes)
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.reranker.top_n = 2;
    config
}

#[tokio::test]
async fn full_run_produces_grounded_answer_with_reranked_sources() {
    let (pipeline, fakes) = build_pipeline(ScriptedChat::happy_path(), &test_config());

    let events: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let progress = |message: &str| events.lock().unwrap().push(message.to_string());

    let response = pipeline
        .process(
            "What about the liability clause we discussed?",
            Some(&progress),
        )
        .await;

    assert_eq!(response.error, None);
    assert_eq!(response.answer, "A grounded answer, citing chunk 1.");
    assert!(!response.degraded);

    // Fusion of [d1, d2] and [d2, d3] is [d1, d2, d3]; reranking keeps the
    // top 2 by cross-encoder score: d1 then d3.
    let sources = response.source_documents.as_ref().unwrap();
    assert_eq!(sources.len(), 1);
    let ids: Vec<&str> = sources[0].hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["d1", "d3"]);
    assert!(sources[0].hits[0].score >= sources[0].hits[1].score);

    // Two retrieval fan-out calls, one batched rerank call.
    assert_eq!(fakes.embedder.calls.load(Ordering::SeqCst), 2);
    assert_eq!(fakes.search.calls.load(Ordering::SeqCst), 2);
    assert_eq!(fakes.encoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.chat.generator_calls.load(Ordering::SeqCst), 1);

    // Retrieval only ever sees the rewritten question and the
    // hypothetical answer, never the raw question.
    let texts = fakes.embedder.texts.lock().unwrap();
    assert!(texts.contains(&REWRITTEN_QUESTION.to_string()));
    assert!(texts.contains(&HYPOTHETICAL_ANSWER.to_string()));

    let events = events.lock().unwrap();
    assert_eq!(events.first().map(String::as_str), Some("Checking guardrails..."));
    assert!(events.iter().any(|e| e == "Reranking documents..."));
    assert!(events.iter().any(|e| e == "Final answer generated."));
}

#[tokio::test]
async fn guardrail_rejection_halts_before_retrieval() {
    let chat = ScriptedChat {
        guardrail: Some(
            r#"{"isSafe": false, "reasons": "Cooking is not a legal topic"}"#.to_string(),
        ),
        ..ScriptedChat::happy_path()
    };
    let (pipeline, fakes) = build_pipeline(chat, &test_config());

    let response = pipeline.process("What's a good pasta recipe?", None).await;

    assert_eq!(
        response.error.as_deref(),
        Some("Question did not pass guardrails")
    );
    assert_eq!(response.details.as_deref(), Some("Cooking is not a legal topic"));
    assert!(response.answer.is_empty());
    assert!(response.source_documents.is_none());

    // Nothing after the guardrail executed.
    assert_eq!(fakes.chat.guardrail_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.chat.rewriter_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.chat.hyde_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.chat.generator_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.encoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_guardrail_output_is_surfaced_not_swallowed() {
    let chat = ScriptedChat {
        guardrail: Some("I think this question is fine.".to_string()),
        ..ScriptedChat::happy_path()
    };
    let (pipeline, fakes) = build_pipeline(chat, &test_config());

    let response = pipeline.process("Is this contract valid?", None).await;

    assert_eq!(response.error.as_deref(), Some("Guardrail validation failed"));
    assert!(response
        .details
        .as_deref()
        .unwrap()
        .contains("Malformed model output"));
    assert_eq!(fakes.chat.rewriter_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_rewrite_falls_back_to_original_question() {
    let chat = ScriptedChat {
        rewriter: Some("Sorry, here is a better question: ...".to_string()),
        ..ScriptedChat::happy_path()
    };
    let (pipeline, fakes) = build_pipeline(chat, &test_config());

    let question = "What about the liability clause we discussed?";
    let response = pipeline.process(question, None).await;

    assert_eq!(response.error, None);
    // The fallback retrieves with the original question text.
    let texts = fakes.embedder.texts.lock().unwrap();
    assert!(texts.contains(&question.to_string()));
}

#[tokio::test]
async fn strict_rewrite_propagates_malformed_output() {
    let chat = ScriptedChat {
        rewriter: Some("not json".to_string()),
        ..ScriptedChat::happy_path()
    };
    let mut config = test_config();
    config.llm.strict_rewrite = true;
    let (pipeline, fakes) = build_pipeline(chat, &config);

    let response = pipeline.process("Is this clause enforceable?", None).await;

    assert_eq!(response.error.as_deref(), Some("Question rewriting failed"));
    assert_eq!(fakes.chat.hyde_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hyde_failure_names_its_stage() {
    let chat = ScriptedChat {
        hyde: None,
        ..ScriptedChat::happy_path()
    };
    let (pipeline, fakes) = build_pipeline(chat, &test_config());

    let response = pipeline.process("Is this clause enforceable?", None).await;

    assert_eq!(response.error.as_deref(), Some("HyDE generation failed"));
    assert_eq!(fakes.search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fakes.encoder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generation_failure_degrades_instead_of_erroring() {
    let chat = ScriptedChat {
        generator: None,
        ..ScriptedChat::happy_path()
    };
    let (pipeline, _fakes) = build_pipeline(chat, &test_config());

    let response = pipeline.process("Is this clause enforceable?", None).await;

    // The one stage whose failure does not fail the pipeline.
    assert_eq!(response.error, None);
    assert!(response.degraded);
    assert!(!response.answer.is_empty());
    assert!(response.source_documents.is_some());
}

#[tokio::test]
async fn empty_retrieval_is_a_valid_outcome_not_an_error() {
    struct EmptySearch;
    #[async_trait]
    impl SearchBackend for EmptySearch {
        async fn similarity_search(
            &self,
            _index: &str,
            _query_vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<RetrievalHit>> {
            Ok(Vec::new())
        }

        async fn exists(&self, _index: &str) -> Result<bool> {
            Ok(false)
        }
    }

    let encoder = Arc::new(ScriptedEncoder::new());
    let pipeline = RagPipeline::from_parts(
        Arc::new(ScriptedChat::happy_path()) as Arc<dyn ChatModel>,
        Arc::new(TaggingEmbedder::new()) as Arc<dyn EmbeddingModel>,
        Arc::new(EmptySearch) as Arc<dyn SearchBackend>,
        Arc::clone(&encoder) as Arc<dyn CrossEncoder>,
        ActivityLogger::disabled("test"),
        &test_config(),
    );

    let response = pipeline.process("Is this clause enforceable?", None).await;

    assert_eq!(response.error, None);
    assert!(!response.answer.is_empty());
    let sources = response.source_documents.as_ref().unwrap();
    assert!(sources[0].hits.is_empty());
    // Zero hits skip the cross-encoder entirely.
    assert_eq!(encoder.calls.load(Ordering::SeqCst), 0);
}
