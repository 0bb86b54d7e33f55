use std::sync::Arc;

use super::markdown::{ escape_html, render_simple_markdown };
use super::{ ChatWidget, WidgetError, WidgetKind };
use crate::models::chat::{ ChatMessage, Role };
use crate::session::{ ConversationSession, SessionOptions };
use crate::session::transport::ChatTransport;

pub struct FallbackWidget {
    session: ConversationSession,
}

impl FallbackWidget {
    pub fn new(transport: Arc<dyn ChatTransport>, mut options: SessionOptions) -> Self {
        options.min_typing = None;
        Self { session: ConversationSession::new(transport, options) }
    }
}

impl ChatWidget for FallbackWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Fallback
    }

    fn session(&self) -> &ConversationSession {
        &self.session
    }

    fn render_message(&self, message: &ChatMessage) -> Result<String, WidgetError> {
        Ok(match message.role {
            Role::User => format!("<p>{}</p>", escape_html(&message.content)),
            Role::Assistant | Role::System => {
                format!(r#"<div class="simple-markdown">{}</div>"#, render_simple_markdown(&message.content))
            }
        })
    }
}
