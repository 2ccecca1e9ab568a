//! Conversation history collaborator.
//!
//! Persists chat turns into the history and message indices. The pipeline
//! itself never reads prior turns; each `process` call is stateless with
//! respect to history.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::models::ConversationSummary;
use crate::models::PipelineResponse;
use crate::models::StoredMessage;
use crate::pipeline::TitleStage;
use crate::search::ElasticClient;
use crate::Result;

const DEFAULT_TITLE: &str = "New conversation";

fn timestamp_now() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub struct ConversationHistory {
    es: Arc<ElasticClient>,
    history_index: String,
    message_index: String,
    title_stage: TitleStage,
}

impl ConversationHistory {
    pub fn new(
        es: Arc<ElasticClient>,
        history_index: String,
        message_index: String,
        title_stage: TitleStage,
    ) -> Self {
        Self {
            es,
            history_index,
            message_index,
            title_stage,
        }
    }

    /// Create a conversation titled from its first question and return
    /// its id. A failed title call falls back to a default title; it never
    /// blocks the conversation.
    pub async fn create_conversation(&self, first_question: &str) -> Result<String> {
        let title = match self.title_stage.create_title(first_question).await {
            Ok(generated) => generated.title,
            Err(e) => {
                warn!("Title generation failed, using default: {e}");
                DEFAULT_TITLE.to_string()
            }
        };

        let id = Uuid::new_v4().to_string();
        let document = json!({
            "id": id,
            "title": title,
            "created_at": timestamp_now(),
        });
        self.es.index_document(&self.history_index, &document).await?;

        Ok(id)
    }

    /// Append one chat turn to a conversation
    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
    ) -> Result<()> {
        let document = json!({
            "id": Uuid::new_v4().to_string(),
            "conversation_id": conversation_id,
            "message": content,
            "role": role,
            "timestamp": timestamp_now(),
        });
        self.es.index_document(&self.message_index, &document).await
    }

    /// Persist a question and its pipeline response as two turns.
    ///
    /// The assistant turn stores the answer, or the error rendered as text
    /// when the pipeline failed.
    pub async fn record_exchange(
        &self,
        conversation_id: &str,
        question: &str,
        response: &PipelineResponse,
    ) -> Result<()> {
        self.append_message(conversation_id, "user", question).await?;

        let assistant_text = if let Some(error) = &response.error {
            format!(
                "Error: {error}\nDetails: {}",
                response.details.as_deref().unwrap_or("")
            )
        } else {
            response.answer.clone()
        };
        self.append_message(conversation_id, "assistant", &assistant_text)
            .await
    }

    /// List conversations, newest first
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let body = json!({
            "query": { "match_all": {} },
            "sort": [ { "created_at": { "order": "desc" } } ]
        });
        let hits = self.es.search(&self.history_index, &body).await?;

        Ok(hits
            .into_iter()
            .map(|hit| ConversationSummary {
                id: hit
                    .source
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                title: hit
                    .source
                    .get("title")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(DEFAULT_TITLE)
                    .to_string(),
                created_at: hit
                    .source
                    .get("created_at")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }

    /// Load a conversation's messages, oldest first
    pub async fn load_messages(&self, conversation_id: &str) -> Result<Vec<StoredMessage>> {
        let body = json!({
            "query": { "match": { "conversation_id": conversation_id } },
            "sort": [ { "timestamp": { "order": "asc" } } ]
        });
        let hits = self.es.search(&self.message_index, &body).await?;

        Ok(hits
            .into_iter()
            .map(|hit| StoredMessage {
                role: hit
                    .source
                    .get("role")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("user")
                    .to_string(),
                content: hit
                    .source
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }
}
