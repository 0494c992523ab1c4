use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn in a conversation, in the wire shape the completion providers
/// expect ({role, content}).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Per-session conversation memory, ephemeral and bounded. Chat turns are
/// never persisted server-side; this exists only so follow-up questions have
/// context within one browser visit.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    messages: Vec<ChatMessage>,
}

/// Keep the last 40 entries (20 exchanges), matching the advisory widget's
/// context window.
pub const HISTORY_LIMIT: usize = 40;

/// Only the last 20 entries (10 exchanges) go into the provider prompt; the
/// rest stay in memory in case the widget ever needs them.
pub const PROMPT_WINDOW: usize = 20;

impl SessionHistory {
    pub fn push_exchange(&mut self, user: ChatMessage, assistant: ChatMessage) {
        self.messages.push(user);
        self.messages.push(assistant);
        if self.messages.len() > HISTORY_LIMIT {
            let excess = self.messages.len() - HISTORY_LIMIT;
            self.messages.drain(..excess);
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }
}
