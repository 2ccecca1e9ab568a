//! Rewrite stage: expand vague questions into self-contained queries

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::config::LlmConfig;
use crate::llm::parse_structured;
use crate::llm::prompts::REWRITER_SYSTEM_PROMPT;
use crate::llm::ChatModel;
use crate::llm::ChatOptions;
use crate::models::RewrittenQuery;
use crate::Result;

/// Rewrites vague or incomplete questions into explicit, self-contained
/// form; already-explicit questions get at most superficial wording
/// changes. Downstream retrieval only ever sees the rewritten text.
pub struct RewriteStage {
    chat: Arc<dyn ChatModel>,
    options: ChatOptions,
    strict: bool,
}

impl RewriteStage {
    pub fn new(chat: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            chat,
            // Higher temperature than the classifier stages for more
            // diverse rewrites.
            options: ChatOptions {
                model: config.rewriter_model.clone(),
                temperature: 0.5,
                max_tokens: config.max_tokens,
            },
            strict: config.strict_rewrite,
        }
    }

    /// Rewrite a question.
    ///
    /// Upstream chat failures propagate. Malformed structured output falls
    /// back to the original question (logged) unless `strict_rewrite` is
    /// set, in which case it propagates like every other stage.
    pub async fn rewrite(&self, question: &str) -> Result<RewrittenQuery> {
        debug!("Rewriting question if needed");
        let raw = self
            .chat
            .complete(REWRITER_SYSTEM_PROMPT, question, &self.options)
            .await?;

        match parse_structured::<RewrittenQuery>(&raw) {
            Ok(rewritten) => Ok(rewritten),
            Err(e) if !self.strict => {
                warn!("Rewriter returned malformed output, keeping original question: {e}");
                Ok(RewrittenQuery {
                    needed_rewrite: false,
                    rewritten_question: question.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}
