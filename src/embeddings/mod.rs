//! Embedding generation for retrieval queries

pub mod client;

use async_trait::async_trait;

pub use client::HttpEmbeddingClient;

use crate::models::Embedding;
use crate::Result;

/// Text-to-vector capability.
///
/// The produced vector's dimension must match the dense-vector dimension of
/// the documents index; implementations validate this and fail rather than
/// return a mismatched vector.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding>;
}
