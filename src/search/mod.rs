//! Document index client and index mappings

pub mod elastic;
pub mod mappings;

use async_trait::async_trait;

pub use elastic::ElasticClient;

use crate::models::RetrievalHit;
use crate::Result;

/// The document-index collaborator as the pipeline sees it.
///
/// A nonexistent index is empty results, not an error the pipeline
/// originates; provisioning belongs to setup.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Cosine-similarity search, descending score, at most `top_k` hits
    async fn similarity_search(
        &self,
        index: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalHit>>;

    /// Whether an index exists
    async fn exists(&self, index: &str) -> Result<bool>;
}
