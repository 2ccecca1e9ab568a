//! Pipeline orchestrator: sequences the stages, reports progress, and
//! converts any stage failure into a uniform response.

use std::sync::Arc;

use tracing::info;
use tracing::warn;

use crate::activity::ActivityLogger;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingModel;
use crate::embeddings::HttpEmbeddingClient;
use crate::llm::ChatModel;
use crate::llm::HttpChatClient;
use crate::models::PipelineResponse;
use crate::pipeline::merge_retrieval_sets;
use crate::pipeline::CrossEncoder;
use crate::pipeline::GeneratorStage;
use crate::pipeline::GuardrailStage;
use crate::pipeline::HttpCrossEncoder;
use crate::pipeline::HydeStage;
use crate::pipeline::Reranker;
use crate::pipeline::Retriever;
use crate::pipeline::RewriteStage;
use crate::search::ElasticClient;
use crate::search::SearchBackend;
use crate::Result;

/// Stage-transition progress callback. Called synchronously with a short
/// human-readable status string; it must not panic, and whatever it does
/// with the string is not the pipeline's concern.
pub type ProgressCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// The complete query-processing pipeline.
///
/// Model handles are built once at construction and shared read-only
/// across requests; each `process` call owns all of its intermediate
/// state, so one instance can serve concurrent requests.
pub struct RagPipeline {
    guardrail: GuardrailStage,
    rewriter: RewriteStage,
    hyde: HydeStage,
    retriever: Retriever,
    reranker: Reranker,
    generator: GeneratorStage,
    activity: ActivityLogger,
    top_k: usize,
    top_n: usize,
}

impl RagPipeline {
    /// Build the pipeline with HTTP clients from configuration.
    ///
    /// Fails if any client cannot be constructed; in particular an invalid
    /// reranker endpoint is fatal here, since the reranker cannot operate
    /// without its model.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let chat: Arc<dyn ChatModel> = Arc::new(HttpChatClient::new(&config.llm)?);
        let embedder: Arc<dyn EmbeddingModel> =
            Arc::new(HttpEmbeddingClient::new(&config.embeddings)?);
        let elastic = Arc::new(ElasticClient::new(&config.elasticsearch)?);
        let encoder: Arc<dyn CrossEncoder> = Arc::new(HttpCrossEncoder::new(&config.reranker)?);
        let activity = ActivityLogger::new(
            "pipeline",
            Arc::clone(&elastic),
            config.elasticsearch.activity_index.clone(),
        );

        Ok(Self::from_parts(
            chat, embedder, elastic, encoder, activity, config,
        ))
    }

    /// Build the pipeline from explicit collaborators.
    ///
    /// This is the seam tests use to substitute fakes for the model
    /// clients and the index.
    pub fn from_parts(
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingModel>,
        search: Arc<dyn SearchBackend>,
        encoder: Arc<dyn CrossEncoder>,
        activity: ActivityLogger,
        config: &AppConfig,
    ) -> Self {
        Self {
            guardrail: GuardrailStage::new(Arc::clone(&chat), &config.llm),
            rewriter: RewriteStage::new(Arc::clone(&chat), &config.llm),
            hyde: HydeStage::new(Arc::clone(&chat), &config.llm),
            retriever: Retriever::new(embedder, search, config.documents_index().to_string()),
            reranker: Reranker::new(encoder),
            generator: GeneratorStage::new(chat, &config.llm),
            activity,
            top_k: config.retrieval_top_k(),
            top_n: config.rerank_top_n(),
        }
    }

    /// Process one question to completion.
    ///
    /// Always returns a response: either a grounded (or degraded) answer
    /// with sources, or an error naming the stage that failed. No stage
    /// after a failed one executes.
    pub async fn process(
        &self,
        question: &str,
        progress: Option<ProgressCallback<'_>>,
    ) -> PipelineResponse {
        info!("Processing question: {}", question);

        self.emit(progress, "Checking guardrails...");
        let verdict = match self.guardrail.validate(question).await {
            Ok(verdict) => verdict,
            Err(e) => return self.fail(progress, "Guardrail validation failed", &e.to_string()),
        };
        if !verdict.is_safe {
            let reasons = verdict.reasons.unwrap_or_default();
            warn!("Question failed guardrails: {reasons}");
            return self.fail(progress, "Question did not pass guardrails", &reasons);
        }
        self.emit(progress, "Question passed guardrails.");

        self.emit(progress, "Rewriting question if needed...");
        let rewritten = match self.rewriter.rewrite(question).await {
            Ok(rewritten) => rewritten,
            Err(e) => return self.fail(progress, "Question rewriting failed", &e.to_string()),
        };

        self.emit(progress, "Generating hypothetical answer...");
        let hypothetical = match self.hyde.generate(&rewritten.rewritten_question).await {
            Ok(hypothetical) => hypothetical,
            Err(e) => return self.fail(progress, "HyDE generation failed", &e.to_string()),
        };

        // The two retrievals are independent; fan out and join. Fusion
        // order depends on logical role (rewritten first, HyDE second),
        // never on completion order.
        self.emit(progress, "Retrieving documents...");
        let (rewritten_docs, hyde_docs) = tokio::join!(
            self.retriever
                .retrieve(&rewritten.rewritten_question, self.top_k),
            self.retriever
                .retrieve(&hypothetical.hypothetical_answer, self.top_k),
        );
        let rewritten_docs = match rewritten_docs {
            Ok(docs) => docs,
            Err(e) => return self.fail(progress, "Document retrieval failed", &e.to_string()),
        };
        let hyde_docs = match hyde_docs {
            Ok(docs) => docs,
            Err(e) => {
                return self.fail(progress, "Document retrieval for HyDE failed", &e.to_string())
            }
        };
        self.emit(
            progress,
            &format!(
                "Retrieved {} + {} documents.",
                rewritten_docs.len(),
                hyde_docs.len()
            ),
        );

        let merged = merge_retrieval_sets(&rewritten_docs, &hyde_docs);

        self.emit(progress, "Reranking documents...");
        let reranked = match self.reranker.rerank(question, &merged, self.top_n).await {
            Ok(reranked) => reranked,
            Err(e) => return self.fail(progress, "Document reranking failed", &e.to_string()),
        };
        self.emit(
            progress,
            &format!("Reranked to {} documents.", reranked.len()),
        );

        self.emit(progress, "Generating final answer...");
        let generation = self.generator.answer(question, &reranked.contents()).await;
        self.emit(progress, "Final answer generated.");

        let sources = vec![reranked];
        if generation.is_degraded() {
            self.activity
                .record("warning", "Generation failed, returning degraded answer");
            PipelineResponse::degraded(generation.text().to_string(), sources)
        } else {
            PipelineResponse::answered(generation.text().to_string(), sources)
        }
    }

    fn emit(&self, progress: Option<ProgressCallback<'_>>, message: &str) {
        info!("{message}");
        self.activity.record("info", message);
        if let Some(callback) = progress {
            callback(message);
        }
    }

    fn fail(
        &self,
        progress: Option<ProgressCallback<'_>>,
        error: &str,
        details: &str,
    ) -> PipelineResponse {
        warn!("{error}: {details}");
        self.activity.record("error", &format!("{error}: {details}"));
        if let Some(callback) = progress {
            callback(error);
        }
        PipelineResponse::failure(error, details)
    }
}
