use std::sync::Arc;

use tokio::sync::mpsc;

#[derive(Debug)]
pub enum Event {
    Notice(crate::models::NoticeMessage),

    /// Number of chat rows written after a completed reply.
    ChatSaved(usize),
}

#[macro_export]
macro_rules! notice_error {
    ($msg:expr) => {
        $crate::models::Event::Notice($crate::models::NoticeMessage::error($msg))
    };
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
