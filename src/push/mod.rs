//! Merging asynchronously delivered push events into session state.
//!
//! [`PushMerger`] is the single ingress point for the event kinds the
//! server pushes once a project is active: new chat messages and typing
//! notices (unread-count changes are derived from messages). It owns the
//! chat log and the typing indicator; the board model is only ever
//! touched through the session, keeping the merger and the mutation
//! engine the sole writers of shared state.

pub mod channel;

pub use channel::{ClientFrame, PushChannel, ServerFrame};

use std::time::{Duration, Instant};

use tracing::debug;

use crate::engine::Session;
use crate::model::ChatMessage;

/// Quiet period after the most recent typing event before the indicator
/// clears. One timer per viewer: any event restarts it, whoever typed.
pub const TYPING_TIMEOUT: Duration = Duration::from_millis(2000);

/// An event delivered over the push channel.
#[derive(Debug, Clone)]
pub enum PushEvent {
    NewMessage(ChatMessage),
    UserTyping { username: String },
}

/// The project chat log plus its scroll anchoring.
///
/// `append` reports whether the view should advance to the new message:
/// only when the log was already pinned to its bottom, so reading
/// scrollback is never yanked away by incoming traffic.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    pinned_to_latest: bool,
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            pinned_to_latest: true,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned_to_latest
    }

    /// The view scrolled: pinned only while at the bottom.
    pub fn set_pinned(&mut self, pinned: bool) {
        self.pinned_to_latest = pinned;
    }

    /// Append a pushed message; returns whether the scroll should follow.
    pub fn append(&mut self, message: ChatMessage) -> bool {
        self.messages.push(message);
        self.pinned_to_latest
    }

    /// Replace the log with fetched history, keeping any messages that
    /// were pushed while the fetch was in flight. Merged by id, so the
    /// race between `join` and the history request produces neither
    /// duplicates nor losses.
    pub fn load_history(&mut self, history: Vec<ChatMessage>) {
        let raced: Vec<ChatMessage> = self
            .messages
            .drain(..)
            .filter(|m| !history.iter().any(|h| h.id == m.id))
            .collect();
        self.messages = history;
        self.messages.extend(raced);
    }
}

/// Transient "someone is typing" indicator with a restartable deadline.
#[derive(Debug, Default)]
pub struct TypingIndicator {
    username: Option<String>,
    deadline: Option<Instant>,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A typing event arrived: show `username` and restart the timer.
    /// The deadline is replaced, never extended additively.
    pub fn notify(&mut self, username: &str, at: Instant) {
        self.username = Some(username.to_string());
        self.deadline = Some(at + TYPING_TIMEOUT);
    }

    /// Who is typing, if the indicator is still live at `now`.
    pub fn visible_at(&self, now: Instant) -> Option<&str> {
        match self.deadline {
            Some(deadline) if now < deadline => self.username.as_deref(),
            _ => None,
        }
    }

    /// Clear once the deadline has passed; returns whether it cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.username = None;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// When the indicator should next be re-examined.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Single ingress point for push events.
#[derive(Debug)]
pub struct PushMerger {
    pub chat: ChatLog,
    pub typing: TypingIndicator,
    chat_open: bool,
}

impl Default for PushMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl PushMerger {
    pub fn new() -> Self {
        Self {
            chat: ChatLog::new(),
            typing: TypingIndicator::new(),
            chat_open: false,
        }
    }

    pub fn set_chat_open(&mut self, open: bool) {
        self.chat_open = open;
    }

    pub fn chat_open(&self) -> bool {
        self.chat_open
    }

    /// Merge one event into shared state. Messages append to the log and
    /// count as unread while the chat panel is closed; typing notices
    /// restart the indicator regardless of sender.
    pub fn ingest(&mut self, session: &mut Session, event: PushEvent, now: Instant) {
        match event {
            PushEvent::NewMessage(message) => {
                debug!(message_id = message.id, "push: new message");
                self.chat.append(message);
                if !self.chat_open {
                    session.bump_unread();
                }
            }
            PushEvent::UserTyping { username } => {
                self.typing.notify(&username, now);
            }
        }
    }
}
