//! Primary chat widget: replies go through the full markdown engine.
//!
//! Rendering writes into a `String`, so in practice it does not fail and
//! `WidgetError::Render` is not produced here today. The panel still treats any
//! render error from a widget as the signal to switch to the fallback.

use std::sync::Arc;

use super::markdown::{ escape_html, render_markdown };
use super::{ ChatWidget, WidgetError, WidgetKind };
use crate::models::chat::{ ChatMessage, Role };
use crate::session::{ ConversationSession, SessionOptions };
use crate::session::transport::ChatTransport;

pub struct PrimaryWidget {
    session: ConversationSession,
}

impl PrimaryWidget {
    pub fn try_new(transport: Arc<dyn ChatTransport>, options: SessionOptions) -> Result<Self, WidgetError> {
        if options.system_prompt.trim().is_empty() {
            return Err(WidgetError::Init("system prompt is empty".to_string()));
        }
        if let Some(greeting) = &options.greeting {
            render_markdown(greeting).map_err(|e| WidgetError::Init(format!("greeting does not render: {}", e)))?;
        }
        Ok(Self { session: ConversationSession::new(transport, options) })
    }
}

impl ChatWidget for PrimaryWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Primary
    }

    fn session(&self) -> &ConversationSession {
        &self.session
    }

    fn render_message(&self, message: &ChatMessage) -> Result<String, WidgetError> {
        match message.role {
            Role::User => Ok(format!("<p>{}</p>", escape_html(&message.content))),
            Role::Assistant | Role::System => {
                let html = render_markdown(&message.content)?;
                Ok(format!(r#"<div class="markdown-bubble">{}</div>"#, html))
            }
        }
    }
}
