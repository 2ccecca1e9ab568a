use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Rerank error: {0}")]
    Rerank(String),

    #[error("Chat model error: {0}")]
    ChatModel(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LexRagError {
    /// Whether the error originated in an external service call
    /// (embedding inference, index search, chat or rerank model).
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Embedding(_)
                | Self::Search(_)
                | Self::Rerank(_)
                | Self::ChatModel(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LexRagError>;
