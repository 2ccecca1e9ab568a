//! Dense retrieval against the documents index

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbeddingModel;
use crate::models::RetrievalSet;
use crate::search::SearchBackend;
use crate::Result;

/// Embeds a query and runs a cosine-similarity search against the
/// documents index. Zero hits and a missing index are both an empty set,
/// not an error; embedding and search failures propagate without retry.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingModel>,
    search: Arc<dyn SearchBackend>,
    documents_index: String,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingModel>,
        search: Arc<dyn SearchBackend>,
        documents_index: String,
    ) -> Self {
        Self {
            embedder,
            search,
            documents_index,
        }
    }

    /// Retrieve up to `top_k` hits for a query, descending by score
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<RetrievalSet> {
        debug!("Retrieving documents for query: {}", query);

        let embedding = self.embedder.embed(query).await?;
        let mut hits = self
            .search
            .similarity_search(&self.documents_index, &embedding.vector, top_k)
            .await?;
        hits.truncate(top_k);

        Ok(RetrievalSet::new(hits))
    }
}
