//! Guardrail stage: domain and safety classification

use std::sync::Arc;

use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::parse_structured;
use crate::llm::prompts::GUARDRAIL_SYSTEM_PROMPT;
use crate::llm::ChatModel;
use crate::llm::ChatOptions;
use crate::models::GuardrailVerdict;
use crate::Result;

/// Classifies whether a question belongs to the legal domain and is safe
/// to answer. Short follow-up questions that could continue a prior legal
/// exchange are accepted; the system prompt resolves ambiguity toward
/// acceptance.
pub struct GuardrailStage {
    chat: Arc<dyn ChatModel>,
    options: ChatOptions,
}

impl GuardrailStage {
    pub fn new(chat: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            chat,
            options: ChatOptions {
                model: config.guardrail_model.clone(),
                temperature: 0.2,
                max_tokens: config.max_tokens,
            },
        }
    }

    /// Validate a question.
    ///
    /// A verdict with `is_safe == false` is a valid terminal outcome, not
    /// an error. A classifier that does not return a well-formed verdict
    /// fails with `MalformedModelOutput`; that failure is surfaced, not
    /// retried.
    pub async fn validate(&self, question: &str) -> Result<GuardrailVerdict> {
        debug!("Validating question against guardrails");
        let raw = self
            .chat
            .complete(GUARDRAIL_SYSTEM_PROMPT, question, &self.options)
            .await?;
        parse_structured(&raw)
    }
}
