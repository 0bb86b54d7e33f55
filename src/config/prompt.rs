use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;
use thiserror::Error;

pub const TOPIC_REMINDER: &str = "\n\nIMPORTANT REMINDER: You must ONLY answer questions about F9 Productions, architecture, design, and related services. For any other topics, politely decline to answer and redirect the conversation back to architecture.";

pub const OFF_TOPIC_REDIRECT: &str = "I'm specialized in architectural services provided by F9 Productions. I'd be happy to discuss your architectural design needs, home renovations, commercial projects, or our design-build process instead. How can I assist you with your architectural project?";

pub const EXTRACTION_APOLOGY: &str = "I encountered an issue processing the response. Please try again.";
pub const EMPTY_RESPONSE_APOLOGY: &str = "I apologize, but I received an empty response. Please try again.";
pub const FORMAT_APOLOGY: &str = "I apologize, but I encountered an unexpected response format. Please try again.";

const REFUSAL_INDICATORS: [&str; 6] = [
    "I cannot provide information about",
    "I don't have information on",
    "that falls outside my expertise",
    "I cannot discuss",
    "I'm not able to discuss",
    "I'm not programmed to",
];

const DOMAIN_TERMS: [&str; 14] = [
    "architecture",
    "design",
    "construction",
    "building",
    "home",
    "house",
    "renovation",
    "remodel",
    "structure",
    "F9",
    "F14",
    "property",
    "residential",
    "commercial",
];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Prompt JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Prompt field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// Server-side prompt texts and topic-guard vocabulary.
///
/// Every field falls back to the built-in text, so a prompts file only needs to name
/// what it overrides.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub topic_reminder: String,
    pub refusal_indicators: Vec<String>,
    pub domain_terms: Vec<String>,
    pub off_topic_redirect: String,
    pub extraction_apology: String,
    pub empty_response_apology: String,
    pub format_apology: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            topic_reminder: TOPIC_REMINDER.to_string(),
            refusal_indicators: REFUSAL_INDICATORS.iter().map(|s| s.to_string()).collect(),
            domain_terms: DOMAIN_TERMS.iter().map(|s| s.to_string()).collect(),
            off_topic_redirect: OFF_TOPIC_REDIRECT.to_string(),
            extraction_apology: EXTRACTION_APOLOGY.to_string(),
            empty_response_apology: EMPTY_RESPONSE_APOLOGY.to_string(),
            format_apology: FORMAT_APOLOGY.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        let required = [
            ("off_topic_redirect", &self.off_topic_redirect),
            ("extraction_apology", &self.extraction_apology),
            ("empty_response_apology", &self.empty_response_apology),
            ("format_apology", &self.format_apology),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(PromptError::EmptyField(name));
            }
        }
        Ok(())
    }
}

pub fn load_prompts_from_str(json: &str) -> Result<PromptConfig, PromptError> {
    let config: PromptConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(path.as_ref())?;
    let config = load_prompts_from_str(&file_content)?;
    info!("Loaded prompt overrides from {}", path.as_ref().display());
    Ok(Arc::new(config))
}

/// Loads the prompts file when one is configured, otherwise the built-in texts.
pub fn resolve_prompts(path: Option<&str>) -> Result<Arc<PromptConfig>, PromptError> {
    match path {
        Some(p) if !p.trim().is_empty() => load_prompts(p),
        _ => Ok(Arc::new(PromptConfig::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config = load_prompts_from_str(r#"{ "domain_terms": ["atrium"] }"#).unwrap();
        assert_eq!(config.domain_terms, vec!["atrium".to_string()]);
        assert_eq!(config.off_topic_redirect, OFF_TOPIC_REDIRECT);
        assert_eq!(config.refusal_indicators.len(), 6);
    }

    #[test]
    fn blank_apology_is_rejected() {
        let err = load_prompts_from_str(r#"{ "format_apology": "  " }"#).unwrap_err();
        assert!(matches!(err, PromptError::EmptyField("format_apology")));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "topic_reminder": "\n\nStay on architecture." }}"#).unwrap();
        let config = load_prompts(file.path()).unwrap();
        assert_eq!(config.topic_reminder, "\n\nStay on architecture.");
    }

    #[test]
    fn missing_path_falls_back_to_builtin() {
        let config = resolve_prompts(None).unwrap();
        assert_eq!(*config, PromptConfig::default());
        assert!(resolve_prompts(Some("/definitely/not/here.json")).is_err());
    }
}
