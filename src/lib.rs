//! LexRAG: grounded legal question answering over a private document index.
//!
//! The crate's core is [`pipeline::RagPipeline`], a multi-stage pipeline
//! that takes a raw question and produces either a grounded answer with
//! cited sources or a structured failure, passing through guardrail
//! validation, query rewriting, hypothetical-answer expansion, dual
//! retrieval, fusion, reranking, and generation.

pub mod activity;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod history;
pub mod llm;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod setup;

pub use config::AppConfig;
pub use errors::*;
pub use models::PipelineResponse;
pub use pipeline::RagPipeline;
