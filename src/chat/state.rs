#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::models::{Conversation, Message, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendPhase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl SendPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, SendPhase::Sending | SendPhase::Streaming)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SendPhase::Completed | SendPhase::Failed | SendPhase::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyInput,

    #[error("a reply is still in progress")]
    Busy,

    #[error("cannot {action} while {phase:?}")]
    InvalidPhase {
        action: &'static str,
        phase: SendPhase,
    },
}

/// Receives every transcript snapshot, in update order.
pub trait TranscriptObserver {
    fn on_transcript(&self, conversation: &Conversation);
}

pub type ArcTranscriptObserver = Arc<dyn TranscriptObserver + Send + Sync>;

pub struct ChatState {
    conversation: Conversation,
    phase: SendPhase,
    observers: Vec<ArcTranscriptObserver>,
    tx: watch::Sender<Conversation>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatState {
    pub fn new() -> Self {
        Self::with_conversation(Conversation::default())
    }

    pub fn with_conversation(conversation: Conversation) -> Self {
        let (tx, _) = watch::channel(conversation.clone());
        Self {
            conversation,
            phase: SendPhase::Idle,
            observers: vec![],
            tx,
        }
    }

    pub fn add_observer(&mut self, observer: ArcTranscriptObserver) {
        self.observers.push(observer);
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.tx.subscribe()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn phase(&self) -> SendPhase {
        self.phase
    }

    /// Appends the user turn and returns the history to send, which ends
    /// with that turn.
    pub fn submit(&mut self, text: &str) -> Result<Conversation, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.phase.is_active() {
            return Err(ChatError::Busy);
        }

        self.phase = SendPhase::Sending;
        self.replace(self.conversation.with_message(Message::new_user(text)));
        Ok(self.conversation.clone())
    }

    pub fn start_reply(&mut self) -> Result<(), ChatError> {
        self.expect_phase("start a reply", SendPhase::Sending)?;
        self.phase = SendPhase::Streaming;
        self.replace(self.conversation.with_message(Message::new_assistant("")));
        Ok(())
    }

    pub fn apply_delta(&mut self, delta: &str) -> Result<(), ChatError> {
        self.expect_phase("apply a delta", SendPhase::Streaming)?;

        let content = match self.conversation.last_message() {
            Some(last) if last.role() == Role::Assistant => format!("{}{}", last.content(), delta),
            _ => {
                return Err(ChatError::InvalidPhase {
                    action: "apply a delta",
                    phase: self.phase,
                });
            }
        };
        self.replace(self.conversation.with_last_content(content));
        Ok(())
    }

    pub fn complete(&mut self) -> Result<Message, ChatError> {
        self.expect_phase("complete a reply", SendPhase::Streaming)?;

        let reply = self
            .conversation
            .last_message_of(Role::Assistant)
            .cloned()
            .ok_or(ChatError::InvalidPhase {
                action: "complete a reply",
                phase: self.phase,
            })?;
        self.phase = SendPhase::Completed;
        Ok(reply)
    }

    /// The transcript keeps whatever was already streamed.
    pub fn fail(&mut self) {
        if self.phase.is_active() {
            self.phase = SendPhase::Failed;
        } else {
            log::debug!("ignoring fail while {:?}", self.phase);
        }
    }

    pub fn cancel(&mut self) {
        if self.phase.is_active() {
            self.phase = SendPhase::Cancelled;
        } else {
            log::debug!("ignoring cancel while {:?}", self.phase);
        }
    }

    pub fn settle(&mut self) {
        if self.phase.is_terminal() {
            self.phase = SendPhase::Idle;
        }
    }

    pub fn clear(&mut self) -> Result<(), ChatError> {
        if self.phase.is_active() {
            return Err(ChatError::Busy);
        }
        self.phase = SendPhase::Idle;
        self.replace(Conversation::default());
        Ok(())
    }

    fn expect_phase(&self, action: &'static str, phase: SendPhase) -> Result<(), ChatError> {
        if self.phase != phase {
            return Err(ChatError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn replace(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        for observer in &self.observers {
            observer.on_transcript(&self.conversation);
        }
        self.tx.send_replace(self.conversation.clone());
    }
}
