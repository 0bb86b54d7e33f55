use std::sync::Arc;
use log::{ info, warn };

use super::fallback::FallbackWidget;
use super::{ ChatWidget, WidgetKind };
use crate::session::{ SessionError, SessionOptions, TurnOutcome };
use crate::session::transport::ChatTransport;

/// Whatever scrolls behind the chat window.
pub trait ScrollHost: Send + Sync {
    fn lock_scroll(&self);
    fn unlock_scroll(&self);
}

/// Background scrolling stays locked for as long as this guard lives.
pub struct ScrollLock {
    host: Arc<dyn ScrollHost>,
}

impl ScrollLock {
    pub fn acquire(host: Arc<dyn ScrollHost>) -> Self {
        host.lock_scroll();
        Self { host }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.host.unlock_scroll();
    }
}

/// The floating chat window: open/closed state, greeting, and the widget behind it.
pub struct ChatPanel {
    widget: Box<dyn ChatWidget>,
    transport: Arc<dyn ChatTransport>,
    host: Arc<dyn ScrollHost>,
    scroll_lock: Option<ScrollLock>,
    greeted: bool,
}

impl ChatPanel {
    pub fn new(widget: Box<dyn ChatWidget>, transport: Arc<dyn ChatTransport>, host: Arc<dyn ScrollHost>) -> Self {
        Self {
            widget,
            transport,
            host,
            scroll_lock: None,
            greeted: false,
        }
    }

    pub fn widget(&self) -> &dyn ChatWidget {
        self.widget.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.scroll_lock.is_some()
    }

    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.scroll_lock = Some(ScrollLock::acquire(self.host.clone()));
        if !self.greeted {
            self.widget.session().greet();
            self.greeted = true;
        }
    }

    pub fn close(&mut self) {
        self.scroll_lock = None;
    }

    pub fn toggle(&mut self) {
        if self.is_open() {
            self.close();
        } else {
            self.open();
        }
    }

    pub async fn send(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        self.widget.session().send(text).await
    }

    /// Renders the transcript, switching to the fallback widget if the current one
    /// fails to render.
    pub fn render(&mut self) -> String {
        match self.widget.render_transcript() {
            Ok(html) => html,
            Err(e) => {
                warn!("{}; switching to the fallback chat widget", e);
                self.degrade();
                self.widget.render_transcript().unwrap_or_default()
            }
        }
    }

    fn degrade(&mut self) {
        if self.widget.kind() == WidgetKind::Fallback {
            return;
        }
        self.widget = Box::new(FallbackWidget::new(self.transport.clone(), SessionOptions::fallback()));
        info!("Fallback chat session {} active", self.widget.session().id());
        self.greeted = false;
        if self.is_open() {
            self.widget.session().greet();
            self.greeted = true;
        }
    }
}
