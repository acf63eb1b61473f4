pub mod service;
pub mod state;

pub use service::{ChatService, SendOutcome, error_message};
pub use state::{ArcTranscriptObserver, ChatError, ChatState, SendPhase, TranscriptObserver};
