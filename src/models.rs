//! Core data model for the LexRAG pipeline.
//!
//! Every entity here is created fresh per request and owned by the
//! pipeline invocation that produced it; the only shared state is the
//! model clients, which are read-only after construction.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Metadata attached to every embedding we produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingMetadata {
    pub model: String,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
}

/// A dense vector for a piece of text, with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: EmbeddingMetadata,
}

/// Metadata stored alongside each indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub embedding_model: String,
    pub embedding_date: String,
    pub embedding_dimension: usize,
}

/// Shape of a document in the documents index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_title: String,
    pub content: String,
    pub embeddings: Vec<f32>,
    pub metadata: DocumentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Verdict of the guardrail classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailVerdict {
    pub is_safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons: Option<String>,
}

/// Output of the rewrite stage.
///
/// `rewritten_question` is always populated, equal to the original when no
/// rewrite was needed. Retrieval only ever sees this text, never the raw
/// question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenQuery {
    pub needed_rewrite: bool,
    pub rewritten_question: String,
}

/// A model-generated hypothetical answer, used only as a retrieval query
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HypotheticalAnswer {
    pub hypothetical_answer: String,
}

/// Short title for a conversation, produced from its first question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTitle {
    pub title: String,
}

/// One hit from the document index.
///
/// Identity key is `id`; fusion enforces uniqueness on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub index: String,
    pub id: String,
    pub score: f32,
    pub source: HashMap<String, Value>,
}

impl RetrievalHit {
    /// Document body, empty when the field is missing
    pub fn content(&self) -> &str {
        self.source
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Document title, or a placeholder when the field is missing
    pub fn title(&self) -> &str {
        self.source
            .get("doc_title")
            .and_then(Value::as_str)
            .unwrap_or("No Title")
    }
}

/// An ordered sequence of hits, descending by score as returned by the
/// index. Order is preserved through fusion for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSet {
    pub hits: Vec<RetrievalHit>,
}

impl RetrievalSet {
    pub fn new(hits: Vec<RetrievalHit>) -> Self {
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Document contents in hit order
    pub fn contents(&self) -> Vec<String> {
        self.hits
            .iter()
            .map(|hit| hit.content().to_string())
            .collect()
    }
}

/// Final outcome of one pipeline invocation.
///
/// Exactly one of `answer` (non-empty) or `error` (non-empty) holds for a
/// completed request. `degraded` marks an answer that was recovered from a
/// generation failure rather than grounded in retrieved context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_documents: Option<Vec<RetrievalSet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub degraded: bool,
}

impl PipelineResponse {
    /// A grounded answer with its supporting sources
    pub fn answered(answer: String, sources: Vec<RetrievalSet>) -> Self {
        Self {
            answer,
            source_documents: Some(sources),
            error: None,
            details: None,
            degraded: false,
        }
    }

    /// A failure-recovered answer from the generation stage
    pub fn degraded(answer: String, sources: Vec<RetrievalSet>) -> Self {
        Self {
            answer,
            source_documents: Some(sources),
            error: None,
            details: None,
            degraded: true,
        }
    }

    /// A stage failure; `error` names the stage, `details` the cause
    pub fn failure(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            answer: String::new(),
            source_documents: None,
            error: Some(error.into()),
            details: Some(details.into()),
            degraded: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A conversation as listed in the history index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

/// One persisted chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
}
