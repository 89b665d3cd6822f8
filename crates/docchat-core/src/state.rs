//! UI-agnostic conversation state types
//!
//! These are shared between the TUI and the one-shot CLI and carry no
//! dependency on any UI framework.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// A single turn in the conversation. Immutable once created; ordering is
/// insertion order in the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// Human-readable creation time, stamped when the message is built.
    pub timestamp: String,
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Bot",
        }
    }
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::stamped(Sender::User, text.into())
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::stamped(Sender::Bot, text.into())
    }

    fn stamped(sender: Sender, text: String) -> Self {
        Self {
            sender,
            text,
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_round_trip_through_json() {
        let message = ChatMessage {
            sender: Sender::User,
            text: "What is 2+2?".to_string(),
            timestamp: "09:15".to_string(),
        };

        let raw = serde_json::to_string(&message).unwrap();
        let back: ChatMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn constructors_stamp_a_timestamp() {
        let message = ChatMessage::bot("hello");
        assert_eq!(message.sender, Sender::Bot);
        assert!(!message.timestamp.is_empty());
    }

    #[test]
    fn sender_labels() {
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Bot.label(), "Bot");
    }
}
