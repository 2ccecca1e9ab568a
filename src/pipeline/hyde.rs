//! HyDE stage: hypothetical-document query expansion

use std::sync::Arc;

use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::parse_structured;
use crate::llm::prompts::HYDE_SYSTEM_PROMPT;
use crate::llm::ChatModel;
use crate::llm::ChatOptions;
use crate::models::HypotheticalAnswer;
use crate::Result;

/// Generates a plausible hypothetical answer to the rewritten question.
/// The text is used only as a second retrieval query, to find documents
/// whose content resembles a good answer; it is never shown to the user
/// and its factuality is not validated.
pub struct HydeStage {
    chat: Arc<dyn ChatModel>,
    options: ChatOptions,
}

impl HydeStage {
    pub fn new(chat: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            chat,
            options: ChatOptions {
                model: config.hyde_model.clone(),
                temperature: 0.7,
                max_tokens: config.max_tokens,
            },
        }
    }

    pub async fn generate(&self, rewritten_question: &str) -> Result<HypotheticalAnswer> {
        debug!("Generating hypothetical answer");
        let raw = self
            .chat
            .complete(HYDE_SYSTEM_PROMPT, rewritten_question, &self.options)
            .await?;
        parse_structured(&raw)
    }
}
