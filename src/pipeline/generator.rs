//! Generation stage: grounded answer synthesis

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::config::LlmConfig;
use crate::llm::prompts::generator_user_message;
use crate::llm::prompts::GENERATOR_SYSTEM_PROMPT;
use crate::llm::ChatModel;
use crate::llm::ChatOptions;

/// Fallback text returned when generation fails
pub const GENERATION_FALLBACK: &str = "There was an error generating the answer.";

/// Outcome of the generation stage.
///
/// `Degraded` is a failure recovered into a placeholder answer; callers
/// can tell it apart from a genuine grounded answer instead of comparing
/// against a string sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Grounded(String),
    Degraded(String),
}

impl Generation {
    pub fn text(&self) -> &str {
        match self {
            Self::Grounded(text) | Self::Degraded(text) => text,
        }
    }

    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Produces the final answer from the original question and the reranked
/// document contents, constrained to the supplied context.
///
/// This is the one stage that never fails the pipeline: from here on the
/// user always receives a response, degraded if necessary.
pub struct GeneratorStage {
    chat: Arc<dyn ChatModel>,
    options: ChatOptions,
}

impl GeneratorStage {
    pub fn new(chat: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            chat,
            options: ChatOptions {
                model: config.generator_model.clone(),
                temperature: 0.7,
                max_tokens: config.max_tokens,
            },
        }
    }

    /// Answer a question from context passages
    pub async fn answer(&self, question: &str, passages: &[String]) -> Generation {
        debug!("Generating final answer from {} passages", passages.len());

        let context = passages.join("\n\n");
        let user_message = generator_user_message(question, &context);

        match self
            .chat
            .complete(GENERATOR_SYSTEM_PROMPT, &user_message, &self.options)
            .await
        {
            Ok(text) if !text.trim().is_empty() => Generation::Grounded(text),
            Ok(_) => {
                warn!("Generator returned an empty completion");
                Generation::Degraded(GENERATION_FALLBACK.to_string())
            }
            Err(e) => {
                warn!("Answer generation failed, returning fallback: {e}");
                Generation::Degraded(GENERATION_FALLBACK.to_string())
            }
        }
    }
}
