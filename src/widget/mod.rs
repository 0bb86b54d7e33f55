//! Chat widgets sitting on top of a [`ConversationSession`].
//!
//! The primary widget renders replies with a full markdown engine. When it cannot be
//! built, or fails while rendering, the panel swaps in the fallback widget: same turn
//! loop against the same proxy, minimal markdown, no minimum typing time.

pub mod fallback;
pub mod markdown;
pub mod panel;
pub mod primary;

use crate::models::chat::{ ChatMessage, Role };
use crate::session::{ ConversationSession, SessionOptions };
use crate::session::transport::ChatTransport;
use self::fallback::FallbackWidget;
use self::primary::PrimaryWidget;

use log::warn;
use std::sync::Arc;
use thiserror::Error;

pub const TYPING_INDICATOR: &str = r#"<div class="typing-indicator"><div class="dot"></div><div class="dot"></div><div class="dot"></div></div>"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetKind {
    Primary,
    Fallback,
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Chat widget failed to initialize: {0}")]
    Init(String),
    #[error("Chat widget failed to render: {0}")]
    Render(#[from] std::fmt::Error),
}

pub trait ChatWidget: Send + Sync {
    fn kind(&self) -> WidgetKind;

    fn session(&self) -> &ConversationSession;

    /// Renders one message body as an HTML fragment.
    fn render_message(&self, message: &ChatMessage) -> Result<String, WidgetError>;

    fn render_transcript(&self) -> Result<String, WidgetError> {
        let mut out = String::new();
        for message in self.session().history() {
            let class = match message.role {
                Role::User => "user",
                Role::Assistant | Role::System => "bot",
            };
            out.push_str(&format!(
                r#"<div class="message {}"><div class="message-bubble">{}</div></div>"#,
                class,
                self.render_message(&message)?
            ));
        }
        if self.session().is_typing() {
            out.push_str(TYPING_INDICATOR);
        }
        Ok(out)
    }
}

/// Builds the primary widget, or the fallback when the primary initializer fails.
pub fn select_widget<P, F>(init_primary: P, init_fallback: F) -> Box<dyn ChatWidget>
    where
        P: FnOnce() -> Result<Box<dyn ChatWidget>, WidgetError>,
        F: FnOnce() -> Box<dyn ChatWidget>
{
    match init_primary() {
        Ok(widget) => widget,
        Err(e) => {
            warn!("{}; falling back to the simple chat widget", e);
            init_fallback()
        }
    }
}

pub fn open_widget(transport: Arc<dyn ChatTransport>) -> Box<dyn ChatWidget> {
    let fallback_transport = transport.clone();
    select_widget(
        move || {
            PrimaryWidget::try_new(transport, SessionOptions::primary())
                .map(|w| Box::new(w) as Box<dyn ChatWidget>)
        },
        move || Box::new(FallbackWidget::new(fallback_transport, SessionOptions::fallback()))
    )
}
