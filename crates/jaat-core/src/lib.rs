//! Core domain types and error definitions for the JAAT chat relay.
//!
//! This crate provides the types shared by the relay crates:
//!
//! - [`ChatError`] — Error type for chat validation and completion calls
//! - [`Message`] and [`MessageRole`] — Provider-neutral conversation messages
//! - [`ChatTurn`] — A prior exchange as sent by the browser front end
//!
//! # Example
//!
//! ```rust
//! use jaat_core::{ChatTurn, Message, MessageRole};
//!
//! let turn = ChatTurn { is_user: false, text: "Hello!".to_string() };
//! let msg = Message::from(&turn);
//!
//! assert_eq!(msg.role, MessageRole::Assistant);
//! assert_eq!(msg.content, "Hello!");
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while handling a chat request.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Required input was missing or out of bounds.
    #[error("{0}")]
    Validation(String),

    /// The completion API request failed.
    #[error("LLM request failed: {0}")]
    Upstream(String),

    /// The completion API did not answer in time.
    #[error("LLM request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ChatError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns `true` if the error was caused by client input.
    pub fn is_validation(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant/LLM.
    Assistant,
}

/// A single message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl Message {
    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// One prior exchange in the wire format used by the front end.
///
/// Missing fields default to an assistant turn with empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    /// `true` when the user wrote this turn.
    #[serde(default)]
    pub is_user: bool,
    /// The text of the turn.
    #[serde(default)]
    pub text: String,
}

impl ChatTurn {
    /// Returns the role this turn maps to.
    pub fn role(&self) -> MessageRole {
        match self.is_user {
            true => MessageRole::User,
            false => MessageRole::Assistant,
        }
    }
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        Self { role: turn.role(), content: turn.text.clone() }
    }
}
