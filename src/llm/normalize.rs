//! Reduces the loosely-shaped payloads returned by chat-completions providers to a
//! single plain-text answer.

use log::error;
use serde_json::{ Map, Value };
use thiserror::Error;

/// Alternate text fields probed on a choice, highest priority first.
pub const ALTERNATE_TEXT_FIELDS: [&str; 5] = ["text", "output", "result", "answer", "response"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Response data is not an object")]
    NotAnObject,
    #[error("First choice is null")]
    NullChoice,
    #[error("Could not extract content from model response")]
    UnrecognizedShape,
    #[error("Failed to serialize choice: {0}")]
    Serialize(String),
}

/// Tagged view over an untrusted provider payload.
#[derive(Debug, PartialEq)]
pub enum ProviderResponse<'a> {
    /// `choices` was a non-empty array; carries its first element.
    Choice(&'a Value),
    /// No usable `choices`, but a top-level `generated_text` string.
    GeneratedText(&'a str),
}

/// Where text was found inside a choice element.
#[derive(Debug, PartialEq)]
pub enum ChoiceContent<'a> {
    Nested(&'a str),
    Flat(&'a str),
    Alternate { field: &'static str, text: &'a str },
    Unrecognized(&'a Value),
}

impl<'a> ProviderResponse<'a> {
    pub fn classify(value: &'a Value) -> Result<Self, DecodeError> {
        let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

        if let Some(first) = object
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        {
            return Ok(ProviderResponse::Choice(first));
        }

        match object.get("generated_text") {
            Some(Value::String(text)) => Ok(ProviderResponse::GeneratedText(text)),
            _ => Err(DecodeError::UnrecognizedShape),
        }
    }
}

impl<'a> ChoiceContent<'a> {
    pub fn classify(choice: &'a Value) -> Result<Self, DecodeError> {
        let fields = match choice {
            Value::Null => return Err(DecodeError::NullChoice),
            Value::Object(fields) => fields,
            other => return Ok(ChoiceContent::Unrecognized(other)),
        };

        if let Some(text) = nested_content(fields) {
            return Ok(ChoiceContent::Nested(text));
        }
        if let Some(Value::String(text)) = fields.get("content") {
            return Ok(ChoiceContent::Flat(text));
        }
        for field in ALTERNATE_TEXT_FIELDS {
            if let Some(Value::String(text)) = fields.get(field) {
                if !text.is_empty() {
                    return Ok(ChoiceContent::Alternate { field, text });
                }
            }
        }
        Ok(ChoiceContent::Unrecognized(choice))
    }

    fn into_text(self) -> Result<String, DecodeError> {
        match self {
            ChoiceContent::Nested(text) | ChoiceContent::Flat(text) => Ok(text.to_string()),
            ChoiceContent::Alternate { text, .. } => Ok(text.to_string()),
            ChoiceContent::Unrecognized(choice) => serde_json::to_string(choice)
                .map_err(|e| DecodeError::Serialize(e.to_string())),
        }
    }
}

fn nested_content(fields: &Map<String, Value>) -> Option<&str> {
    fields
        .get("message")
        .and_then(Value::as_object)
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
}

/// Extracts the answer text, or reports why the payload could not be understood.
pub fn decode(value: &Value) -> Result<String, DecodeError> {
    match ProviderResponse::classify(value)? {
        ProviderResponse::Choice(choice) => ChoiceContent::classify(choice)?.into_text(),
        ProviderResponse::GeneratedText(text) => Ok(text.to_string()),
    }
}

/// Like [`decode`], but any failure becomes `apology`.
pub fn normalize(value: &Value, apology: &str) -> String {
    match decode(value) {
        Ok(text) => text,
        Err(e) => {
            error!("Error extracting model content: {}", e);
            apology.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SORRY: &str = "sorry";

    #[test]
    fn nested_message_content_wins() {
        let payload = json!({ "choices": [{ "message": { "content": "X" }, "content": "flat", "text": "alt" }] });
        assert_eq!(normalize(&payload, SORRY), "X");
    }

    #[test]
    fn flat_content_when_message_has_no_string() {
        let payload = json!({ "choices": [{ "message": { "content": null }, "content": "X" }] });
        assert_eq!(normalize(&payload, SORRY), "X");
        let payload = json!({ "choices": [{ "content": "X" }] });
        assert_eq!(normalize(&payload, SORRY), "X");
    }

    #[test]
    fn alternate_fields_follow_priority() {
        let payload = json!({ "choices": [{ "answer": "X" }] });
        assert_eq!(normalize(&payload, SORRY), "X");

        let payload = json!({ "choices": [{ "response": "r", "answer": "a", "result": "res", "output": "o" }] });
        assert_eq!(normalize(&payload, SORRY), "o");

        let payload = json!({ "choices": [{ "response": "r", "text": "t", "answer": "a" }] });
        assert_eq!(normalize(&payload, SORRY), "t");
    }

    #[test]
    fn empty_alternate_is_skipped() {
        let payload = json!({ "choices": [{ "text": "", "result": "kept" }] });
        assert_eq!(normalize(&payload, SORRY), "kept");
    }

    #[test]
    fn unknown_choice_is_serialized() {
        let payload = json!({ "choices": [{ "delta": 3 }] });
        assert_eq!(normalize(&payload, SORRY), r#"{"delta":3}"#);
        let payload = json!({ "choices": [7] });
        assert_eq!(normalize(&payload, SORRY), "7");
    }

    #[test]
    fn generated_text_without_choices() {
        let payload = json!({ "generated_text": "X" });
        assert_eq!(normalize(&payload, SORRY), "X");
        let payload = json!({ "choices": [], "generated_text": "X" });
        assert_eq!(normalize(&payload, SORRY), "X");
    }

    #[test]
    fn unusable_payloads_become_apology() {
        for payload in [json!({}), Value::Null, json!("plain string"), json!([1, 2]), json!({ "choices": [null] }), json!({ "choices": "nope" })] {
            assert_eq!(normalize(&payload, SORRY), SORRY, "payload {}", payload);
        }
    }

    #[test]
    fn decode_reports_reason() {
        assert_eq!(decode(&json!(42)), Err(DecodeError::NotAnObject));
        assert_eq!(decode(&json!({ "choices": [null] })), Err(DecodeError::NullChoice));
        assert_eq!(decode(&json!({ "generated_text": 1 })), Err(DecodeError::UnrecognizedShape));
    }
}
