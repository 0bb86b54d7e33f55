//! Client-held conversation for one visitor.
//!
//! The proxy keeps no state, so the session owns the whole history and resends it,
//! behind the system prompt, on every turn. A session serves one send at a time;
//! a second submission while a reply is pending is refused with [`SessionError::Busy`].

pub mod transport;

use crate::models::chat::ChatMessage;
use self::transport::ChatTransport;

use log::{ info, warn, debug };
use std::sync::{ Arc, Mutex as StdMutex, RwLock };
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{ broadcast, Mutex, MutexGuard };
use tokio::time::Instant;
use uuid::Uuid;

pub const SYSTEM_PROMPT: &str = r#"You are the AI customer support assistant for F9 Productions, a premier architecture and design firm serving Colorado.

COMPANY IDENTITY:
- Founded in 2009, F9 Productions is an award-winning architecture firm with offices in Longmont and Denver
- Over 10 years of experience, 1,000+ completed projects, and 100+ clients
- Sister company F14 Productions handles construction, offering integrated design-build services
- Brand voice is professional yet friendly, personable while demonstrating expertise
- Company operates on nine founding principles with responsive communication as a key value (responding within one hour)

PRIMARY SERVICES:
- Architectural Design: Innovative, functional designs for residential and commercial projects
- Interior Design: Full-service interior transformation including 3D modeling and visualization
- Home Remodeling and Additions: Renovating and expanding existing homes throughout Colorado
- Construction Services: Integrated construction through sister company F14 Productions

PROJECT TYPES:
- Single-family homes
- Multi-family homes
- Mixed-use developments
- Commercial properties

UNIQUE SELLING POINTS:
- Integrated design-build approach that sets F9 Productions apart from competitors
- Every team member has practical construction experience, making designs both beautiful and buildable
- Deep understanding of Colorado architecture, particularly Boulder and Denver regions
- Experience addressing unique challenges of building in the Rocky Mountain Region

FORMAT YOUR RESPONSES:
- Use markdown formatting with **bold** for emphasis on key services, benefits, and terms
- Include bulleted lists when presenting multiple options or service categories
- Be conversational, friendly yet professional
- Highlight the integrated design-build advantage in relevant contexts
- When answering questions, emphasize F9's experience and practical construction knowledge

When greeting users, provide a friendly welcome that introduces F9 Productions and offers several service categories they might be interested in. Be helpful, creative, and accurate in representing F9 Productions' brand and services."#;

pub const FALLBACK_SYSTEM_PROMPT: &str = "You are the AI customer support assistant for F9 Productions, a premier architecture and design firm serving Colorado.";

pub const GREETING: &str = "Hello! Welcome to **F9 Productions**, your go-to architecture and design firm in Colorado. Whether you're looking for residential, multi-family, or commercial design expertise, I'm here to assist.\n\nWhat can I help you with today? Are you:\n- Exploring a new **home design** or **renovation**?\n- Planning a **multi-family** or **mixed-use development**?\n- Interested in **commercial** or **hospitality** architecture?\n- Curious about our **design process** or **services**?\n\nLet me know how I can guide you!";

pub const FALLBACK_GREETING: &str = "Hello! Welcome to **F9 Productions**, your go-to architecture and design firm in Colorado. How can I help you today?";

pub const CLIENT_APOLOGY: &str = "Sorry, I encountered an error while processing your request. Please try again.";
pub const FALLBACK_APOLOGY: &str = "Sorry, I encountered an error while processing your request. Please try again later.";

pub const MIN_TYPING_DURATION: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Success,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    MessageAppended(ChatMessage),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("A message is already being sent")]
    Busy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied(ChatMessage),
    Failed(ChatMessage),
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub system_prompt: String,
    pub greeting: Option<String>,
    pub failure_message: String,
    /// Shortest time the thinking indicator stays up before a reply is shown.
    pub min_typing: Option<Duration>,
}

impl SessionOptions {
    pub fn primary() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            greeting: Some(GREETING.to_string()),
            failure_message: CLIENT_APOLOGY.to_string(),
            min_typing: Some(MIN_TYPING_DURATION),
        }
    }

    pub fn fallback() -> Self {
        Self {
            system_prompt: FALLBACK_SYSTEM_PROMPT.to_string(),
            greeting: Some(FALLBACK_GREETING.to_string()),
            failure_message: FALLBACK_APOLOGY.to_string(),
            min_typing: None,
        }
    }
}

pub struct ConversationSession {
    id: Uuid,
    transport: Arc<dyn ChatTransport>,
    options: SessionOptions,
    history: RwLock<Vec<ChatMessage>>,
    state: StdMutex<SessionState>,
    in_flight: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

/// Held for the duration of one send; puts the session back to `Idle` when dropped.
/// A turn dropped before it settles (the send future was cancelled) gets the failure
/// message, so the history never holds a user message without an answer.
struct Turn<'a> {
    session: &'a ConversationSession,
    settled: bool,
    _permit: MutexGuard<'a, ()>,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Send cancelled for session {}", self.session.id);
            self.session.append(ChatMessage::assistant(self.session.options.failure_message.clone()));
            self.session.set_state(SessionState::Failed);
        }
        self.session.set_state(SessionState::Idle);
    }
}

impl ConversationSession {
    pub fn new(transport: Arc<dyn ChatTransport>, options: SessionOptions) -> Self {
        let (events, _) = broadcast::channel(64);
        let id = Uuid::new_v4();
        info!("Started chat session {}", id);
        Self {
            id,
            transport,
            options,
            history: RwLock::new(Vec::new()),
            state: StdMutex::new(SessionState::Idle),
            in_flight: Mutex::new(()),
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_typing(&self) -> bool {
        self.state() == SessionState::Sending
    }

    /// Visible conversation, oldest first. The system prompt is not part of it.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Adds the greeting once, on an empty conversation. Returns whether it was added.
    pub fn greet(&self) -> bool {
        let greeting = match &self.options.greeting {
            Some(g) => g.clone(),
            None => return false,
        };
        {
            let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
            if !history.is_empty() {
                return false;
            }
            history.push(ChatMessage::assistant(greeting.clone()));
        }
        let _ = self.events.send(SessionEvent::MessageAppended(ChatMessage::assistant(greeting)));
        true
    }

    /// What goes over the wire for the next turn: system prompt, then the history.
    pub fn outbound(&self) -> Vec<ChatMessage> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.options.system_prompt.clone()));
        messages.extend(history.iter().cloned());
        messages
    }

    pub async fn send(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let permit = self.in_flight.try_lock().map_err(|_| {
            debug!("Session {} is busy; ignoring submission", self.id);
            SessionError::Busy
        })?;
        let mut turn = Turn { session: self, settled: false, _permit: permit };

        self.set_state(SessionState::Sending);
        self.append(ChatMessage::user(text));
        let outbound = self.outbound();
        let started = Instant::now();

        match self.transport.send(&outbound).await {
            Ok(reply) => {
                if let Some(min_typing) = self.options.min_typing {
                    let elapsed = started.elapsed();
                    if elapsed < min_typing {
                        tokio::time::sleep(min_typing - elapsed).await;
                    }
                }
                let message = ChatMessage::assistant(reply.content);
                self.append(message.clone());
                self.set_state(SessionState::Success);
                turn.settled = true;
                Ok(TurnOutcome::Replied(message))
            }
            Err(e) => {
                warn!("Error in chatbot communication for session {}: {}", self.id, e);
                let message = ChatMessage::assistant(self.options.failure_message.clone());
                self.append(message.clone());
                self.set_state(SessionState::Failed);
                turn.settled = true;
                Ok(TurnOutcome::Failed(message))
            }
        }
    }

    fn append(&self, message: ChatMessage) {
        self.history
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        let _ = self.events.send(SessionEvent::MessageAppended(message));
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
        let _ = self.events.send(SessionEvent::StateChanged(next));
    }
}
