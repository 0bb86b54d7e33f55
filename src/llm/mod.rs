pub mod chat;
pub mod guard;
pub mod normalize;

use crate::cli::Args;
use std::time::Duration;

pub const DEFAULT_CHAT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_CHAT_TITLE: &str = "F9 Productions Chatbot";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            completion_model: None,
            base_url: None,
            referer: None,
            title: None,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl LlmConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: args.resolved_chat_api_key(),
            completion_model: non_empty(args.chat_model.clone()),
            base_url: non_empty(args.chat_base_url.clone()),
            referer: non_empty(args.site_url.clone()),
            title: non_empty(args.chat_title.clone()),
            timeout: match args.upstream_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
