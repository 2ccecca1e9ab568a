//! Elasticsearch REST client

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::config::ElasticsearchConfig;
use crate::errors::LexRagError;
use crate::models::RetrievalHit;
use crate::search::SearchBackend;
use crate::Result;

/// Thin client over the Elasticsearch REST API.
///
/// Similarity search uses a script-score query with an additive offset
/// (`cosineSimilarity(...) + 1.0`) because the engine rejects negative
/// scores.
pub struct ElasticClient {
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_index")]
    index: String,
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: HashMap<String, Value>,
}

impl From<SearchHit> for RetrievalHit {
    fn from(hit: SearchHit) -> Self {
        Self {
            index: hit.index,
            id: hit.id,
            score: hit.score.unwrap_or(0.0),
            source: hit.source,
        }
    }
}

impl ElasticClient {
    /// Create a client from the `[elasticsearch]` config section
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create an index with the given mapping; existing indices are left alone
    pub async fn create_index(&self, index: &str, mapping: &Value) -> Result<()> {
        if self.index_exists(index).await? {
            debug!("Index {} already exists", index);
            return Ok(());
        }

        let url = format!("{}/{index}", self.base_url);
        let body = json!({ "mappings": mapping });
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LexRagError::Search(format!(
                "Failed to create index {index} ({status}): {error_text}"
            )));
        }

        debug!("Index {} created", index);
        Ok(())
    }

    /// Index a single JSON document
    pub async fn index_document(&self, index: &str, document: &Value) -> Result<()> {
        let url = format!("{}/{index}/_doc", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(document)
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LexRagError::Search(format!(
                "Failed to index document into {index} ({status}): {error_text}"
            )));
        }

        Ok(())
    }

    /// Delete a document by id
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<()> {
        let url = format!("{}/{index}/_doc/{id}", self.base_url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            let status = response.status();
            return Err(LexRagError::Search(format!(
                "Failed to delete document {id} from {index} ({status})"
            )));
        }

        Ok(())
    }

    /// Run an arbitrary search body and return the raw hits.
    ///
    /// A missing index yields no hits.
    pub async fn search(&self, index: &str, body: &Value) -> Result<Vec<RetrievalHit>> {
        let url = format!("{}/{index}/_search", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Index {} does not exist, returning no hits", index);
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LexRagError::Search(format!(
                "Search against {index} failed ({status}): {error_text}"
            )));
        }

        let result: SearchResponse = response
            .json()
            .await
            .map_err(|e| LexRagError::Search(format!("Failed to parse search response: {e}")))?;

        Ok(result.hits.hits.into_iter().map(Into::into).collect())
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        let url = format!("{}/{index}", self.base_url);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    async fn similarity_search(
        &self,
        index: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalHit>> {
        let body = json!({
            "size": top_k,
            "query": {
                "script_score": {
                    "query": { "match_all": {} },
                    "script": {
                        "source": "cosineSimilarity(params.query_vector, 'embeddings') + 1.0",
                        "params": { "query_vector": query_vector }
                    }
                }
            }
        });

        self.search(index, &body).await
    }

    async fn exists(&self, index: &str) -> Result<bool> {
        self.index_exists(index).await
    }
}
