pub mod conversation;
pub mod event;
pub mod message;
pub mod notice;
pub mod storage;

pub use conversation::Conversation;
pub use event::{ArcEventTx, Event, EventTx};
pub use message::{Message, Role};
pub use notice::*;
pub use storage::{ChatRecord, ChatRecordFilter};
