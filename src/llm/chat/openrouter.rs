use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::Serialize;

use super::{ ChatClient, ChatClientError, CompletionResponse, SamplingParams };
use crate::llm::{ LlmConfig, DEFAULT_CHAT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_SITE_URL, DEFAULT_CHAT_TITLE };
use crate::models::chat::ChatMessage;

/// Client for OpenRouter and any other OpenAI-compatible chat-completions endpoint.
pub struct OpenRouterChatClient {
    http: HttpClient,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct OpenRouterChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(flatten)]
    params: &'a SamplingParams,
}

impl OpenRouterChatClient {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, ChatClientError> {
        let model = config.completion_model.clone().unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let url = config.base_url.clone().unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string());
        let referer = config.referer.as_deref().unwrap_or(DEFAULT_SITE_URL);
        let title = config.title.as_deref().unwrap_or(DEFAULT_CHAT_TITLE);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ChatClientError::Config(format!("Invalid API key format: {}", e)))?
        );
        headers.insert(
            HeaderName::from_static("http-referer"),
            HeaderValue::from_str(referer)
                .map_err(|e| ChatClientError::Config(format!("Invalid site URL: {}", e)))?
        );
        headers.insert(
            HeaderName::from_static("x-title"),
            HeaderValue::from_str(title)
                .map_err(|e| ChatClientError::Config(format!("Invalid chat title: {}", e)))?
        );

        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, model, url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatClientError> {
        let api_key = config.api_key
            .as_deref()
            .ok_or_else(|| ChatClientError::Config("OpenRouter API key is required".to_string()))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl ChatClient for OpenRouterChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams
    ) -> Result<CompletionResponse, ChatClientError> {
        let req = OpenRouterChatRequest {
            model: &self.model,
            messages,
            params,
        };
        debug!("Sending {} messages to {} (model {})", messages.len(), self.url, self.model);

        let resp = self.http.post(&self.url).json(&req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!("OpenRouter API error: {}", body);
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&body) {
                error!("Parsed error: {}", parsed);
            }
            return Err(ChatClientError::Status { status: status.as_u16(), body });
        }

        Ok(CompletionResponse { status: status.as_u16(), body })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> String {
        self.url.clone()
    }
}
