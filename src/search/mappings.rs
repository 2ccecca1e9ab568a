//! Index mappings for the Elasticsearch collaborators

use serde_json::json;
use serde_json::Value;

/// Documents index: dense vector dimension comes from config and must match
/// the embedding model's output dimension.
pub fn documents_mapping(embedding_dimension: usize) -> Value {
    json!({
        "properties": {
            "doc_title": { "type": "text" },
            "content": { "type": "text" },
            "embeddings": { "type": "dense_vector", "dims": embedding_dimension },
            "metadata": {
                "properties": {
                    "source": { "type": "keyword" },
                    "date": { "type": "date", "format": "yyyy-MM-dd||yyyy" },
                    "modified": { "type": "date", "format": "yyyy-MM-dd" },
                    "embedding_model": { "type": "keyword" },
                    "embedding_date": { "type": "date", "format": "yyyy-MM-dd" },
                    "embedding_dimension": { "type": "integer" }
                }
            },
            "indexed_at": { "type": "date" }
        }
    })
}

/// History index: one entry per conversation
pub fn history_mapping() -> Value {
    json!({
        "properties": {
            "id": { "type": "keyword" },
            "created_at": { "type": "date", "format": "yyyy-MM-dd HH:mm:ss" },
            "title": { "type": "text" }
        }
    })
}

/// Message index: one entry per chat turn
pub fn message_mapping() -> Value {
    json!({
        "properties": {
            "id": { "type": "text" },
            "conversation_id": {
                "type": "text",
                "fields": { "keyword": { "type": "keyword" } }
            },
            "message": { "type": "text" },
            "timestamp": { "type": "date", "format": "yyyy-MM-dd HH:mm:ss||yyyy-MM-dd||epoch_millis" },
            "role": { "type": "keyword" }
        }
    })
}

/// Activity-log index: best-effort stage and error records
pub fn activity_mapping() -> Value {
    json!({
        "properties": {
            "timestamp": { "type": "date", "format": "yyyy-MM-dd HH:mm:ss||yyyy-MM-dd||epoch_millis" },
            "level": { "type": "keyword" },
            "message": { "type": "text" },
            "source": { "type": "keyword" }
        }
    })
}
