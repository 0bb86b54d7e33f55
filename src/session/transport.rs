use async_trait::async_trait;
use log::{ debug, error };
use reqwest::Client as HttpClient;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::models::chat::{ ChatMessage, ChatRequest, NormalizedReply };

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid chat endpoint '{0}'")]
    InvalidEndpoint(String),
    #[error("Chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} {body}")]
    Status { status: u16, body: String },
}

/// How a session reaches the chat proxy.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<NormalizedReply, TransportError>;
}

pub struct HttpTransport {
    http: HttpClient,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, TransportError> {
        Self::build(endpoint, None)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
        Self::build(endpoint, Some(timeout))
    }

    fn build(endpoint: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint).map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(TransportError::InvalidEndpoint(endpoint.to_string()));
        }
        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { http: builder.build()?, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, messages: &[ChatMessage]) -> Result<NormalizedReply, TransportError> {
        debug!("Sending chat request to {}", self.endpoint);
        let body = ChatRequest { messages: messages.to_vec() };
        let resp = self.http.post(self.endpoint.clone()).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("API response not ok: {} {}", status, body);
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        Ok(resp.json::<NormalizedReply>().await?)
    }
}
