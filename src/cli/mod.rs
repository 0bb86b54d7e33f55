use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    // --- Chat Provider Args ---
    /// API key for the OpenRouter chat-completions provider.
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub chat_api_key: Option<String>,

    /// Secondary key, used only when OPENROUTER_API_KEY is not set.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Model name for chat completion (defaults to mistralai/mistral-7b-instruct).
    #[arg(long, env = "OPENROUTER_MODEL")]
    pub chat_model: Option<String>,

    /// Full URL of the chat-completions endpoint.
    #[arg(long, env = "CHAT_BASE_URL")] // No default, the client falls back to OpenRouter
    pub chat_base_url: Option<String>,

    /// Public site URL, sent to the provider as HTTP-Referer.
    #[arg(long, env = "SITE_URL")]
    pub site_url: Option<String>,

    /// Application title sent to the provider as X-Title.
    #[arg(long, env = "CHAT_TITLE")]
    pub chat_title: Option<String>,

    /// Timeout in seconds for provider calls. 0 leaves the HTTP client default.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "30")]
    pub upstream_timeout_secs: u64,

    /// Optional JSON file overriding prompt texts and topic-guard vocabulary.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Voice Provider Args ---
    /// API key for the Vapi voice-call provider.
    #[arg(long, env = "VAPI_API_KEY")]
    pub vapi_api_key: Option<String>,

    /// Base URL of the Vapi API.
    #[arg(long, env = "VAPI_BASE_URL", default_value = "https://api.vapi.ai")]
    pub vapi_base_url: String,

    /// Pre-provisioned phone number id used by the make-call route.
    #[arg(long, env = "VAPI_PHONE_NUMBER_ID")]
    pub vapi_phone_number_id: Option<String>,

    /// Pre-provisioned assistant id used by the make-call route.
    #[arg(long, env = "VAPI_ASSISTANT_ID")]
    pub vapi_assistant_id: Option<String>,
}

impl Args {
    pub fn resolved_chat_api_key(&self) -> Option<String> {
        self.chat_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.openai_api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        if !self.enable_tls {
            return None;
        }
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.as_str(), key.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_key_is_secondary() {
        let args = Args::parse_from(["f9-assistant", "--openai-api-key", "sk-b"]);
        assert_eq!(args.resolved_chat_api_key().as_deref(), Some("sk-b"));

        let args = Args::parse_from(["f9-assistant", "--chat-api-key", "sk-a", "--openai-api-key", "sk-b"]);
        assert_eq!(args.resolved_chat_api_key().as_deref(), Some("sk-a"));

        let args = Args::parse_from(["f9-assistant", "--chat-api-key", " ", "--openai-api-key", "sk-b"]);
        assert_eq!(args.resolved_chat_api_key().as_deref(), Some("sk-b"));
    }

    #[test]
    fn tls_needs_flag_and_both_paths() {
        let args = Args::parse_from(["f9-assistant", "--tls-cert-path", "c.pem", "--tls-key-path", "k.pem"]);
        assert_eq!(args.tls_paths(), None);
        let args = Args::parse_from(["f9-assistant", "--enable-tls", "--tls-cert-path", "c.pem", "--tls-key-path", "k.pem"]);
        assert_eq!(args.tls_paths(), Some(("c.pem", "k.pem")));
    }
}
