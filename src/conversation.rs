//! Conversation history types
//!
//! The conversation is an ordered, append-only sequence of messages.
//! The only other mutation is a full reset, which empties the sequence.

use serde::{Deserialize, Serialize};

/// Greeting shown when a session starts.
pub const GREETING: &str = "Hi, how can I help you today?";

/// A single message in the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Agent,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Agent,
}

/// Ordered message history for one session.
///
/// Insertion order is chronological order. Messages are never edited in
/// place; `clear` is the only way to remove anything.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// An empty conversation with no greeting.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh conversation holding the initial agent greeting.
    pub fn seeded() -> Self {
        Self {
            messages: vec![ChatMessage::agent(GREETING)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Empties the history. Deliberately does not re-seed the greeting;
    /// after a reset the pane starts blank.
    pub fn clear(&mut self) {
        self.messages.clear();
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_starts_with_greeting() {
        let convo = Conversation::seeded();
        assert_eq!(convo.len(), 1);
        assert_eq!(convo.messages()[0], ChatMessage::agent(GREETING));
    }

    #[test]
    fn push_preserves_insertion_order() {
        let mut convo = Conversation::seeded();
        convo.push(ChatMessage::user("What is 2+2?"));
        convo.push(ChatMessage::agent("4"));

        let roles: Vec<ChatRole> = convo.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![ChatRole::Agent, ChatRole::User, ChatRole::Agent]);
        assert_eq!(convo.messages()[1].content, "What is 2+2?");
        assert_eq!(convo.messages()[2].content, "4");
    }

    #[test]
    fn clear_empties_history() {
        let mut convo = Conversation::seeded();
        convo.push(ChatMessage::user("hello"));
        convo.clear();
        assert_eq!(convo.len(), 0);
        assert!(convo.is_empty());
    }

    #[test]
    fn clear_does_not_restore_greeting() {
        let mut convo = Conversation::seeded();
        convo.clear();
        assert!(convo.messages().is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::agent("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "agent");
    }
}
