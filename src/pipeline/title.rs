//! Title stage: short conversation titles for the history sidebar

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::llm::parse_structured;
use crate::llm::prompts::TITLE_SYSTEM_PROMPT;
use crate::llm::ChatModel;
use crate::llm::ChatOptions;
use crate::models::ConversationTitle;
use crate::Result;

/// Produces a short title from the first question of a conversation.
/// Callers fall back to a default title on failure; a missing title never
/// blocks a conversation.
pub struct TitleStage {
    chat: Arc<dyn ChatModel>,
    options: ChatOptions,
}

impl TitleStage {
    pub fn new(chat: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            chat,
            options: ChatOptions {
                model: config.title_model.clone(),
                temperature: 0.7,
                max_tokens: config.max_tokens,
            },
        }
    }

    pub async fn create_title(&self, question: &str) -> Result<ConversationTitle> {
        let raw = self
            .chat
            .complete(TITLE_SYSTEM_PROMPT, question, &self.options)
            .await?;
        parse_structured(&raw)
    }
}
