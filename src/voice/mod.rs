//! Forwarding layer for the "book a call" buttons. Each operation is a single call to
//! the Vapi API; nothing is retried or stored.

use crate::cli::Args;
use crate::llm::non_empty;
use crate::models::voice::{
    AssistantCreated,
    CallRequest,
    CallStarted,
    CreateAssistantRequest,
    CreatePhoneNumberRequest,
    PhoneNumberCreated,
    VoiceErrorBody,
};

use log::{ info, error, debug };
use reqwest::Client as HttpClient;
use serde_json::{ json, Value as JsonValue };
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ASSISTANT_NAME: &str = "F9 Productions Assistant";
const FIRST_MESSAGE_TEMPLATE: &str = "Hello {{name}}, this is F9 Productions calling. Thank you for your interest in our services. How can we help you today?";
const PHONE_ASSISTANT_PROMPT: &str = "You are a helpful assistant for F9 Productions, an architecture firm. \
Be friendly, professional, and helpful. Answer questions about our architectural services, \
design process, and how we work with clients. If they ask about pricing, explain that \
it varies by project scope and you'd be happy to arrange a consultation with one of our architects. \
Keep responses concise and conversational as this is a phone call.";

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("API key not configured")]
    NotConfigured,
    #[error("{0}")]
    MissingFields(&'static str),
    #[error("{message}")]
    Provider { status: u16, message: String },
    #[error("Internal server error")]
    Transport(#[from] reqwest::Error),
}

impl VoiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            VoiceError::NotConfigured | VoiceError::Transport(_) => 500,
            VoiceError::MissingFields(_) => 400,
            VoiceError::Provider { status, .. } => *status,
        }
    }

    pub fn to_body(&self) -> VoiceErrorBody {
        let error = match self {
            VoiceError::Transport(e) => Some(e.to_string()),
            _ => None,
        };
        VoiceErrorBody { message: self.to_string(), error }
    }
}

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub phone_number_id: Option<String>,
    pub assistant_id: Option<String>,
    pub timeout: Option<Duration>,
}

impl VoiceConfig {
    pub fn from_args(args: &Args) -> Self {
        Self {
            api_key: non_empty(args.vapi_api_key.clone()),
            base_url: args.vapi_base_url.clone(),
            phone_number_id: non_empty(args.vapi_phone_number_id.clone()),
            assistant_id: non_empty(args.vapi_assistant_id.clone()),
            timeout: match args.upstream_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

pub struct VapiClient {
    http: HttpClient,
    config: VoiceConfig,
}

impl VapiClient {
    pub fn new(config: VoiceConfig) -> Result<Self, VoiceError> {
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        if config.api_key.is_none() {
            info!("Vapi API key not set; call routes will answer 500.");
        }
        Ok(Self { http, config })
    }

    /// Rings the visitor through the pre-provisioned assistant and phone number.
    pub async fn make_call(&self, req: CallRequest) -> Result<CallStarted, VoiceError> {
        let api_key = self.api_key()?;
        let (phone_number_id, assistant_id) = match (&self.config.phone_number_id, &self.config.assistant_id) {
            (Some(p), Some(a)) => (p.as_str(), a.as_str()),
            _ => {
                error!("Vapi phone number or assistant id not configured");
                return Err(VoiceError::NotConfigured);
            }
        };
        let (name, phone) = required_caller(&req)?;
        info!("Making call for {} to {}", name, mask_phone(phone));

        let body = json!({
            "phoneNumberId": phone_number_id,
            "assistantId": assistant_id,
            "assistantOverrides": {
                "variableValues": { "name": name },
                "firstMessage": FIRST_MESSAGE_TEMPLATE,
            },
            "customer": { "number": phone },
        });

        let data = self.post(api_key, "/call/phone", &body, "Failed to initiate call").await?;
        Ok(CallStarted {
            message: "Call initiated successfully".to_string(),
            call_id: string_field(&data, "id"),
        })
    }

    /// Rings the visitor with an assistant defined inline, personalised with their name.
    pub async fn make_direct_call(&self, req: CallRequest) -> Result<CallStarted, VoiceError> {
        let api_key = self.api_key()?;
        let (name, phone) = required_caller(&req)?;
        info!("Making direct call for {} to {}", name, mask_phone(phone));

        let body = json!({
            "assistant": {
                "name": DEFAULT_ASSISTANT_NAME,
                "firstMessage": FIRST_MESSAGE_TEMPLATE.replace("{{name}}", name),
                "model": phone_assistant_model(Some(name)),
                "voice": { "provider": "11labs", "voiceId": "ryan" },
            },
            "customer": { "number": phone },
        });
        debug!("Direct call payload: {}", body);

        let data = self.post(api_key, "/call/phone", &body, "Failed to initiate call").await?;
        Ok(CallStarted {
            message: "Call initiated successfully".to_string(),
            call_id: string_field(&data, "id"),
        })
    }

    pub async fn create_assistant(&self, req: CreateAssistantRequest) -> Result<AssistantCreated, VoiceError> {
        let api_key = self.api_key()?;
        let name = req.name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string());

        let body = json!({
            "name": name,
            "model": phone_assistant_model(None),
            "voice": { "provider": "11labs", "voiceId": "ryan" },
            "firstMessage": FIRST_MESSAGE_TEMPLATE,
        });

        let data = self.post(api_key, "/assistant", &body, "Failed to create assistant").await?;
        Ok(AssistantCreated {
            message: "Assistant created successfully".to_string(),
            assistant_id: string_field(&data, "id"),
        })
    }

    pub async fn create_phone_number(&self, req: CreatePhoneNumberRequest) -> Result<PhoneNumberCreated, VoiceError> {
        let api_key = self.api_key()?;
        let assistant_id = req.assistant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(VoiceError::MissingFields("Assistant ID is required"))?;

        let body = json!({
            "name": "F9 Productions Phone Number",
            "assistantId": assistant_id,
        });

        let data = self.post(api_key, "/phone-number", &body, "Failed to create phone number").await?;
        Ok(PhoneNumberCreated {
            message: "Phone number created successfully".to_string(),
            phone_number_id: string_field(&data, "id"),
            phone_number: string_field(&data, "twilioPhoneNumber")
                .unwrap_or_else(|| "Phone number not available yet".to_string()),
        })
    }

    fn api_key(&self) -> Result<&str, VoiceError> {
        self.config.api_key.as_deref().ok_or_else(|| {
            error!("Vapi API key not configured");
            VoiceError::NotConfigured
        })
    }

    async fn post(
        &self,
        api_key: &str,
        route: &str,
        body: &JsonValue,
        failure_message: &str
    ) -> Result<JsonValue, VoiceError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), route);
        let resp = self.http.post(&url).bearer_auth(api_key).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let data: JsonValue = serde_json::from_str(&text).unwrap_or(JsonValue::Null);
        debug!("Vapi {} responded {}", route, status);

        if !status.is_success() {
            error!("Vapi API error: {}", text);
            return Err(VoiceError::Provider {
                status: status.as_u16(),
                message: string_field(&data, "message").unwrap_or_else(|| failure_message.to_string()),
            });
        }
        Ok(data)
    }
}

fn required_caller(req: &CallRequest) -> Result<(&str, &str), VoiceError> {
    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    match (name, phone) {
        (Some(name), Some(phone)) => Ok((name, phone)),
        _ => Err(VoiceError::MissingFields("Name and phone number are required")),
    }
}

fn phone_assistant_model(caller: Option<&str>) -> JsonValue {
    let prompt = match caller {
        Some(name) => format!(
            "{} You're speaking with {} who has requested information about our services.",
            PHONE_ASSISTANT_PROMPT,
            name
        ),
        None => PHONE_ASSISTANT_PROMPT.to_string(),
    };
    json!({
        "provider": "openai",
        "model": "gpt-4",
        "messages": [{ "role": "system", "content": prompt }],
    })
}

fn string_field(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

/// Keeps the first three characters of a phone number for logs.
pub fn mask_phone(phone: &str) -> String {
    let prefix: String = phone.chars().take(3).collect();
    format!("{}***", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_is_masked() {
        assert_eq!(mask_phone("+15551234567"), "+15***");
        assert_eq!(mask_phone("12"), "12***");
    }

    #[test]
    fn caller_requires_both_fields() {
        let req = CallRequest { name: Some("Ada".into()), phone: Some("  ".into()) };
        assert!(matches!(required_caller(&req), Err(VoiceError::MissingFields(_))));
        let req = CallRequest { name: Some("Ada".into()), phone: Some("+1555".into()) };
        assert_eq!(required_caller(&req).unwrap(), ("Ada", "+1555"));
    }

    #[test]
    fn provider_status_is_passed_through() {
        let err = VoiceError::Provider { status: 422, message: "bad number".into() };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.to_body().message, "bad number");
        assert_eq!(VoiceError::NotConfigured.status_code(), 500);
    }
}
