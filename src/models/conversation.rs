#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use crate::models::{Message, Role};

/// An ordered transcript. Values are never edited in place: every update
/// builds a new `Conversation`, so a snapshot handed to an observer stays
/// valid while streaming continues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Returns a new conversation with `message` appended.
    pub fn with_message(&self, message: Message) -> Self {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.extend_from_slice(&self.messages);
        messages.push(message);
        Self { messages }
    }

    /// Returns a new conversation whose last message carries `content`.
    /// An empty conversation is returned unchanged.
    pub fn with_last_content(&self, content: impl Into<String>) -> Self {
        let mut messages = self.messages.clone();
        if let Some(last) = messages.pop() {
            messages.push(last.with_content(content));
        }
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_message_of(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|msg| msg.role() == role)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
