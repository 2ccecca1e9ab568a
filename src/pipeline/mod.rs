//! The query-processing pipeline.
//!
//! A raw question passes through guardrail validation, query rewriting,
//! hypothetical-answer expansion, dual retrieval, fusion, reranking, and
//! grounded generation:
//!
//! ```text
//! question -> Guardrail -> Rewrite -> HyDE
//!          -> { Retrieve(rewritten), Retrieve(hyde) } -> Fuse
//!          -> Rerank -> Generate -> PipelineResponse
//! ```
//!
//! Stages run strictly in order except the two retrievals, which fan out
//! concurrently and are merged by logical role (rewritten first, HyDE
//! second) regardless of completion order. Any stage failure halts the
//! pipeline and is surfaced as a [`crate::models::PipelineResponse`] naming
//! that stage; generation alone recovers locally into a degraded answer.
//!
//! # Examples
//!
//! ```rust,no_run
//! use lexrag::config::AppConfig;
//! use lexrag::pipeline::RagPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let pipeline = RagPipeline::new(&config)?;
//!
//!     let response = pipeline
//!         .process("What does article 1134 of the civil code provide?", None)
//!         .await;
//!     println!("Answer: {}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod fusion;
pub mod generator;
pub mod guardrail;
pub mod hyde;
pub mod orchestrator;
pub mod reranker;
pub mod retriever;
pub mod rewriter;
pub mod title;

pub use fusion::merge_retrieval_sets;
pub use generator::Generation;
pub use generator::GeneratorStage;
pub use guardrail::GuardrailStage;
pub use hyde::HydeStage;
pub use orchestrator::ProgressCallback;
pub use orchestrator::RagPipeline;
pub use reranker::CrossEncoder;
pub use reranker::HttpCrossEncoder;
pub use reranker::Reranker;
pub use retriever::Retriever;
pub use rewriter::RewriteStage;
pub use title::TitleStage;
