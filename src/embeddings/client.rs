//! HTTP embedding client (OpenAI-compatible wire format)

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::config::EmbeddingsConfig;
use crate::embeddings::EmbeddingModel;
use crate::errors::LexRagError;
use crate::models::Embedding;
use crate::models::EmbeddingMetadata;
use crate::Result;

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// The configured dimension is checked against every response; a mismatch
/// would silently break similarity search, so it fails loudly here instead.
pub struct HttpEmbeddingClient {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    client: Client,
}

impl HttpEmbeddingClient {
    /// Create a client from the `[embeddings]` config section
    pub fn new(config: &EmbeddingsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            client,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingModel for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling embeddings API: {}", url);

        let request = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LexRagError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LexRagError::Embedding(format!(
                "Embeddings API error ({status}): {error_text}"
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LexRagError::Embedding(format!("Failed to parse response: {e}")))?;

        let vector = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LexRagError::Embedding("No embedding in response".to_string()))?;

        if vector.len() != self.dimension {
            return Err(LexRagError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        Ok(Embedding {
            text: text.to_string(),
            vector,
            metadata: EmbeddingMetadata {
                model: self.model.clone(),
                dimension: self.dimension,
                created_at: Utc::now(),
            },
        })
    }
}
