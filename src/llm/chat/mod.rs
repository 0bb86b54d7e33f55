pub mod openrouter;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::LlmConfig;
use crate::models::chat::ChatMessage;
use self::openrouter::OpenRouterChatClient;

/// Phrases that make providers stop before a stock refusal gets going.
pub const REFUSAL_STOP_SEQUENCES: [&str; 3] = [
    "I apologize, but I cannot",
    "I'm sorry, but I cannot",
    "Sorry, I cannot",
];

#[derive(Debug, Error)]
pub enum ChatClientError {
    #[error("Invalid chat client configuration: {0}")]
    Config(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            max_tokens: 1000,
            top_p: 0.9,
            stop_sequences: REFUSAL_STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Raw provider answer. The body stays undecoded so callers decide how to cope with
/// payloads that are not JSON.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one chat-completions request. Non-success statuses are errors.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams
    ) -> Result<CompletionResponse, ChatClientError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatClientError> {
    let client = OpenRouterChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
