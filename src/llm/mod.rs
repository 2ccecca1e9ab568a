//! Chat model clients and prompt templates.
//!
//! Every pipeline stage that talks to a language model goes through the
//! [`ChatModel`] trait so tests can substitute deterministic fakes for the
//! HTTP client.

pub mod client;
pub mod prompts;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub use client::HttpChatClient;

use crate::errors::LexRagError;
use crate::Result;

/// Per-call chat parameters
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A chat completion capability.
///
/// Implementations must be safe to share across concurrent requests; the
/// pipeline holds them behind `Arc` and never mutates them after
/// construction.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the raw assistant text
    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
        options: &ChatOptions,
    ) -> Result<String>;
}

/// Parse a structured-output completion into `T`.
///
/// Models occasionally wrap their JSON in a markdown fence; strip it before
/// parsing. Anything that still fails to deserialize is a
/// [`LexRagError::MalformedModelOutput`], never a panic.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = strip_code_fence(raw.trim());
    serde_json::from_str(trimmed).map_err(|e| {
        LexRagError::MalformedModelOutput(format!("{e}; raw output: {}", truncate(raw, 200)))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the fence line
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map_or(rest, str::trim_end)
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
