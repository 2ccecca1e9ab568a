use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    pub url: String,
    pub documents_index: String,
    pub history_index: String,
    pub message_index: String,
    pub activity_index: String,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub guardrail_model: String,
    #[serde(default = "default_chat_model")]
    pub rewriter_model: String,
    #[serde(default = "default_chat_model")]
    pub hyde_model: String,
    #[serde(default = "default_chat_model")]
    pub generator_model: String,
    #[serde(default = "default_chat_model")]
    pub title_model: String,
    /// Propagate malformed rewriter output as an error instead of
    /// falling back to the original question.
    #[serde(default)]
    pub strict_rewrite: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_chat_model() -> String {
    "gpt-4.1".to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

const fn default_max_tokens() -> u32 {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub endpoint: String,
    pub model: String,
    /// Token budget for each (query, content) pair sent to the cross-encoder.
    pub max_length: usize,
    pub top_n: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub elasticsearch: ElasticsearchConfig,
    pub logging: LoggingConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: LlmConfig,
    pub reranker: RerankerConfig,
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            eprintln!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::LexRagError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get Elasticsearch URL
    pub fn elasticsearch_url(&self) -> &str {
        &self.elasticsearch.url
    }

    /// Get documents index name
    pub fn documents_index(&self) -> &str {
        &self.elasticsearch.documents_index
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get number of hits requested from each retrieval call
    pub fn retrieval_top_k(&self) -> usize {
        self.retrieval.top_k
    }

    /// Get number of hits kept after reranking
    pub fn rerank_top_n(&self) -> usize {
        self.reranker.top_n
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            elasticsearch: ElasticsearchConfig {
                url: "http://localhost:9200".to_string(),
                documents_index: "documents_index".to_string(),
                history_index: "history_index".to_string(),
                message_index: "message_index".to_string(),
                activity_index: "logger_index".to_string(),
                request_timeout: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
            embeddings: EmbeddingsConfig {
                endpoint: "http://localhost:8080".to_string(),
                api_key: None,
                model: "paraphrase-multilingual-mpnet-base-v2".to_string(),
                dimension: 768,
            },
            llm: LlmConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: None,
                guardrail_model: default_chat_model(),
                rewriter_model: default_chat_model(),
                hyde_model: default_chat_model(),
                generator_model: default_chat_model(),
                title_model: default_chat_model(),
                strict_rewrite: false,
                request_timeout: default_request_timeout(),
                max_tokens: default_max_tokens(),
            },
            reranker: RerankerConfig {
                endpoint: "http://localhost:8081".to_string(),
                model: "antoinelouis/crossencoder-camembert-base-mmarcoFR".to_string(),
                max_length: 512,
                top_n: 3,
                request_timeout: default_request_timeout(),
            },
            retrieval: RetrievalConfig { top_k: 5 },
        }
    }
}
