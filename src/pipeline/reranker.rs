//! Reranking: second-pass relevance scoring with a cross-encoder

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::RerankerConfig;
use crate::errors::LexRagError;
use crate::models::RetrievalSet;
use crate::Result;

/// Batched (query, document) relevance scoring.
///
/// One call scores every pair; the returned vector is index-aligned with
/// the input texts.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;
}

/// Client for a text-embeddings-inference style `/rerank` endpoint.
pub struct HttpCrossEncoder {
    endpoint: Url,
    client: Client,
}

impl HttpCrossEncoder {
    /// Create the cross-encoder client.
    ///
    /// An invalid endpoint is a construction-time error: the reranker
    /// cannot operate at all without its model, so pipeline construction
    /// fails rather than deferring the problem to the first request.
    pub fn new(config: &RerankerConfig) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim_end_matches('/'))
            .and_then(|base| base.join("/rerank"))
            .map_err(|e| {
                LexRagError::Config(format!(
                    "Invalid reranker endpoint '{}': {e}",
                    config.endpoint
                ))
            })?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        Ok(Self { endpoint, client })
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    // Let the server truncate each text to the model's maximum length
    // instead of failing on long document contents.
    truncate: bool,
}

#[derive(Deserialize)]
struct RerankScore {
    index: usize,
    score: f32,
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        debug!("Calling rerank API for {} texts", texts.len());

        let request = RerankRequest {
            query,
            texts,
            truncate: true,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| LexRagError::Rerank(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LexRagError::Rerank(format!(
                "Rerank API error ({status}): {error_text}"
            )));
        }

        let ranked: Vec<RerankScore> = response
            .json()
            .await
            .map_err(|e| LexRagError::Rerank(format!("Failed to parse response: {e}")))?;

        // The API returns entries sorted by score; realign to input order.
        let mut scores = vec![0.0; texts.len()];
        for entry in ranked {
            if entry.index >= scores.len() {
                return Err(LexRagError::Rerank(format!(
                    "Rerank API returned out-of-range index {}",
                    entry.index
                )));
            }
            scores[entry.index] = entry.score;
        }

        Ok(scores)
    }
}

/// Reorders a fused retrieval set by cross-encoder relevance and truncates
/// to the top N.
pub struct Reranker {
    encoder: Arc<dyn CrossEncoder>,
}

impl Reranker {
    pub fn new(encoder: Arc<dyn CrossEncoder>) -> Self {
        Self { encoder }
    }

    /// Rerank `docs` against `query` and keep the `min(top_n, |docs|)`
    /// best hits, descending by cross-encoder score. Ties keep the fused
    /// input order (stable sort). An empty input returns an empty set
    /// without invoking the model.
    pub async fn rerank(
        &self,
        query: &str,
        docs: &RetrievalSet,
        top_n: usize,
    ) -> Result<RetrievalSet> {
        if docs.is_empty() {
            debug!("No documents to rerank");
            return Ok(RetrievalSet::default());
        }

        let contents = docs.contents();
        let scores = self.encoder.score(query, &contents).await?;

        if scores.len() != docs.len() {
            return Err(LexRagError::Rerank(format!(
                "Cross-encoder returned {} scores for {} documents",
                scores.len(),
                docs.len()
            )));
        }

        let mut order: Vec<usize> = (0..docs.len()).collect();
        order.sort_by(|&i, &j| scores[j].partial_cmp(&scores[i]).unwrap_or(Ordering::Equal));

        let k = top_n.min(docs.len());
        let hits = order[..k]
            .iter()
            .map(|&i| {
                let mut hit = docs.hits[i].clone();
                hit.score = scores[i];
                hit
            })
            .collect();

        Ok(RetrievalSet::new(hits))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering as AtomicOrdering;

    use serde_json::json;

    use super::*;
    use crate::models::RetrievalHit;

    struct FakeEncoder {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FakeEncoder {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CrossEncoder for FakeEncoder {
        async fn score(&self, _query: &str, texts: &[String]) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            assert_eq!(texts.len(), self.scores.len());
            Ok(self.scores.clone())
        }
    }

    fn hit(id: &str, score: f32) -> RetrievalHit {
        RetrievalHit {
            index: "documents_index".to_string(),
            id: id.to_string(),
            score,
            source: HashMap::from([("content".to_string(), json!(format!("content of {id}")))]),
        }
    }

    #[tokio::test]
    async fn keeps_top_n_by_descending_score() {
        let docs = RetrievalSet::new(vec![hit("d1", 0.9), hit("d2", 0.8), hit("d3", 0.7)]);
        let reranker = Reranker::new(Arc::new(FakeEncoder::new(vec![0.1, 0.9, 0.5])));

        let ranked = reranker.rerank("query", &docs, 2).await.unwrap();
        let ids: Vec<&str> = ranked.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["d2", "d3"]);
        assert!(ranked.hits[0].score >= ranked.hits[1].score);
    }

    #[tokio::test]
    async fn returns_min_of_top_n_and_input_size() {
        let docs = RetrievalSet::new(vec![hit("d1", 0.9), hit("d2", 0.8)]);
        let reranker = Reranker::new(Arc::new(FakeEncoder::new(vec![0.3, 0.6])));

        let ranked = reranker.rerank("query", &docs, 10).await.unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn empty_input_skips_the_model() {
        let encoder = Arc::new(FakeEncoder::new(vec![]));
        let reranker = Reranker::new(encoder.clone());

        let ranked = reranker
            .rerank("query", &RetrievalSet::default(), 3)
            .await
            .unwrap();
        assert!(ranked.is_empty());
        assert_eq!(encoder.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ties_keep_fused_input_order() {
        let docs = RetrievalSet::new(vec![hit("d1", 0.9), hit("d2", 0.8), hit("d3", 0.7)]);
        let reranker = Reranker::new(Arc::new(FakeEncoder::new(vec![0.5, 0.5, 0.5])));

        let ranked = reranker.rerank("query", &docs, 3).await.unwrap();
        let ids: Vec<&str> = ranked.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["d1", "d2", "d3"]);
    }

    #[tokio::test]
    async fn score_count_mismatch_is_an_error() {
        struct Mismatched;
        #[async_trait]
        impl CrossEncoder for Mismatched {
            async fn score(&self, _query: &str, _texts: &[String]) -> Result<Vec<f32>> {
                Ok(vec![0.5])
            }
        }

        let docs = RetrievalSet::new(vec![hit("d1", 0.9), hit("d2", 0.8)]);
        let result = Reranker::new(Arc::new(Mismatched))
            .rerank("query", &docs, 2)
            .await;
        assert!(matches!(result, Err(LexRagError::Rerank(_))));
    }

    #[test]
    fn invalid_endpoint_fails_construction() {
        let config = RerankerConfig {
            endpoint: "not a url".to_string(),
            model: "cross-encoder".to_string(),
            max_length: 512,
            top_n: 3,
            request_timeout: 10,
        };
        assert!(matches!(
            HttpCrossEncoder::new(&config),
            Err(LexRagError::Config(_))
        ));
    }
}
