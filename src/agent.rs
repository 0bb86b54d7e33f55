use crate::cli::Args;
use crate::config::prompt::{ self, PromptConfig };
use crate::llm::LlmConfig;
use crate::llm::chat::{ ChatClient, ChatClientError, SamplingParams, new_client as new_chat_client };
use crate::llm::guard::TopicGuard;
use crate::llm::normalize::normalize;
use crate::models::chat::{ ChatMessage, ErrorBody, NormalizedReply, Role };

use serde_json::Value as JsonValue;
use log::{ info, warn, error, debug };
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Invalid request format")]
    InvalidRequest(String),
    #[error("OpenRouter API key is not configured")]
    NotConfigured,
    #[error("Error communicating with OpenRouter")]
    Upstream(#[source] ChatClientError),
}

impl ProxyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::NotConfigured | ProxyError::Upstream(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            ProxyError::Upstream(ChatClientError::Status { status, .. }) => {
                Some(format!("Provider responded with status {}", status))
            }
            ProxyError::Upstream(ChatClientError::Transport(_)) => {
                Some("Provider could not be reached".to_string())
            }
            _ => None,
        };
        ErrorBody { error: self.to_string(), message }
    }
}

/// Stateless core of the chat route: validate, steer, forward once, normalize.
#[derive(Clone)]
pub struct ChatProxy {
    chat_client: Option<Arc<dyn ChatClient>>,
    prompt_config: Arc<PromptConfig>,
    topic_guard: TopicGuard,
    sampling: SamplingParams,
}

impl ChatProxy {
    pub fn new(chat_client: Option<Arc<dyn ChatClient>>, prompt_config: Arc<PromptConfig>) -> Self {
        let topic_guard = TopicGuard::from_config(&prompt_config);
        Self {
            chat_client,
            prompt_config,
            topic_guard,
            sampling: SamplingParams::default(),
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let prompt_config = prompt::resolve_prompts(args.prompts_path.as_deref())?;
        let llm_config = LlmConfig::from_args(args);

        let chat_client = if llm_config.api_key.is_some() {
            let client = new_chat_client(&llm_config)?;
            info!(
                "Chat client configured: Model={}, URL={}",
                client.get_model(),
                client.get_base_url()
            );
            Some(client)
        } else {
            warn!("OpenRouter API key is not configured; the chat route will answer 500 until it is set.");
            None
        };

        Ok(Self::new(chat_client, prompt_config))
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.chat_client.is_some()
    }

    pub async fn handle(&self, body: &[u8]) -> Result<NormalizedReply, ProxyError> {
        let messages = parse_messages(body).map_err(|reason| {
            warn!("Rejecting chat request: {}", reason);
            ProxyError::InvalidRequest(reason)
        })?;

        let client = self.chat_client.as_ref().ok_or_else(|| {
            error!("OpenRouter API key is not configured");
            ProxyError::NotConfigured
        })?;

        let messages = self.with_topic_reminder(&messages);

        let response = client.complete(&messages, &self.sampling).await.map_err(|e| {
            error!("Chat completion failed: {}", e);
            ProxyError::Upstream(e)
        })?;

        Ok(self.reply_from_body(&response.body))
    }

    /// Returns a copy of `messages` whose leading system prompt carries the topic
    /// reminder. Conversations without a leading system prompt are copied untouched.
    pub fn with_topic_reminder(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut steered = messages.to_vec();
        if let Some(first) = steered.first_mut() {
            if first.role == Role::System {
                first.content.push_str(&self.prompt_config.topic_reminder);
            }
        }
        steered
    }

    /// Turns a successful provider body into the reply sent to the client. Never fails.
    pub fn reply_from_body(&self, body: &str) -> NormalizedReply {
        let data: JsonValue = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(e) => {
                error!("Error processing OpenRouter response: {}", e);
                return NormalizedReply { content: self.prompt_config.format_apology.clone() };
            }
        };
        debug!("OpenRouter response structure: {}", data);

        if is_empty_payload(&data) {
            error!("Empty response from OpenRouter");
            return NormalizedReply { content: self.prompt_config.empty_response_apology.clone() };
        }

        let content = normalize(&data, &self.prompt_config.extraction_apology);
        if content.trim().is_empty() {
            warn!("Provider returned blank content");
            return NormalizedReply { content: self.prompt_config.empty_response_apology.clone() };
        }

        NormalizedReply { content: self.topic_guard.apply(content) }
    }
}

fn parse_messages(body: &[u8]) -> Result<Vec<ChatMessage>, String> {
    let value: JsonValue = serde_json::from_slice(body).map_err(|e| format!("body is not JSON: {}", e))?;
    let messages = value
        .get("messages")
        .ok_or_else(|| "missing 'messages'".to_string())?;
    if !messages.is_array() {
        return Err("'messages' is not an array".to_string());
    }
    serde_json::from_value(messages.clone()).map_err(|e| format!("malformed message: {}", e))
}

fn is_empty_payload(data: &JsonValue) -> bool {
    match data {
        JsonValue::Null | JsonValue::Bool(false) => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::prompt::{ EMPTY_RESPONSE_APOLOGY, EXTRACTION_APOLOGY, FORMAT_APOLOGY, OFF_TOPIC_REDIRECT, TOPIC_REMINDER };

    fn proxy() -> ChatProxy {
        ChatProxy::new(None, Arc::new(PromptConfig::default()))
    }

    #[test]
    fn reminder_is_appended_to_a_copy() {
        let incoming = vec![ChatMessage::system("You help."), ChatMessage::user("Hi")];
        let steered = proxy().with_topic_reminder(&incoming);
        assert_eq!(steered[0].content, format!("You help.{}", TOPIC_REMINDER));
        assert_eq!(incoming[0].content, "You help.");
        assert_eq!(steered[1], incoming[1]);
    }

    #[test]
    fn reminder_skipped_without_leading_system() {
        let incoming = vec![ChatMessage::user("Hi"), ChatMessage::system("late")];
        assert_eq!(proxy().with_topic_reminder(&incoming), incoming);
    }

    #[test]
    fn body_variants() {
        let p = proxy();
        assert_eq!(p.reply_from_body("<html>").content, FORMAT_APOLOGY);
        assert_eq!(p.reply_from_body("null").content, EMPTY_RESPONSE_APOLOGY);
        assert_eq!(p.reply_from_body("{}").content, EXTRACTION_APOLOGY);
        assert_eq!(p.reply_from_body(r#"{"choices":[{"message":{"content":"  "}}]}"#).content, EMPTY_RESPONSE_APOLOGY);
        assert_eq!(
            p.reply_from_body(r#"{"choices":[{"message":{"content":"I'm not programmed to do taxes."}}]}"#).content,
            OFF_TOPIC_REDIRECT
        );
        assert_eq!(p.reply_from_body(r#"{"generated_text":"Welcome!"}"#).content, "Welcome!");
    }

    #[test]
    fn request_shapes() {
        assert!(parse_messages(b"not json").is_err());
        assert!(parse_messages(br#"{}"#).is_err());
        assert!(parse_messages(br#"{"messages":"hello"}"#).is_err());
        assert!(parse_messages(br#"{"messages":[{"role":"robot","content":"x"}]}"#).is_err());
        assert!(parse_messages(br#"{"messages":[]}"#).unwrap().is_empty());
        let parsed = parse_messages(br#"{"messages":[{"role":"user","content":"Hello"}]}"#).unwrap();
        assert_eq!(parsed, vec![ChatMessage::user("Hello")]);
    }

    #[tokio::test]
    async fn unconfigured_proxy_rejects_valid_request() {
        let err = proxy().handle(br#"{"messages":[{"role":"user","content":"Hello"}]}"#).await.unwrap_err();
        assert!(matches!(err, ProxyError::NotConfigured));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_body().error, "OpenRouter API key is not configured");
    }

    #[tokio::test]
    async fn validation_precedes_configuration() {
        let err = proxy().handle(br#"{"messages":{"role":"user"}}"#).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_body().error, "Invalid request format");
    }
}
