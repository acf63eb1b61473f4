#[cfg(test)]
#[path = "service_test.rs"]
mod tests;

use eyre::{Context, Result};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::backend::{ArcBackend, BackendError};
use crate::chat::state::{ChatError, ChatState};
use crate::models::{ArcEventTx, ChatRecord, Conversation, Event, Message};
use crate::notice_error;
use crate::session::ArcSession;
use crate::storage::ArcStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Rejected(ChatError),
    /// Carries the text of the notice that was emitted.
    Failed(String),
    Cancelled,
    Completed(Message),
}

pub struct ChatService {
    backend: ArcBackend,
    storage: ArcStorage,
    session: ArcSession,
    event_tx: ArcEventTx,
}

impl ChatService {
    pub fn new(
        backend: ArcBackend,
        storage: ArcStorage,
        session: ArcSession,
        event_tx: ArcEventTx,
    ) -> Self {
        Self {
            backend,
            storage,
            session,
            event_tx,
        }
    }

    pub async fn send(
        &self,
        state: &mut ChatState,
        text: &str,
        cancel: CancellationToken,
    ) -> SendOutcome {
        let history = match state.submit(text) {
            Ok(history) => history,
            Err(err) => {
                log::debug!("message rejected: {}", err);
                return SendOutcome::Rejected(err);
            }
        };

        let outcome = match self.stream_reply(state, &history, &cancel).await {
            Ok(Some(reply)) => match self.persist(&history, &reply).await {
                Ok(()) => SendOutcome::Completed(reply),
                Err(err) => self.notify_failure(err).await,
            },
            Ok(None) => {
                log::info!("reply cancelled");
                SendOutcome::Cancelled
            }
            Err(err) => {
                state.fail();
                self.notify_failure(err).await
            }
        };

        state.settle();
        outcome
    }

    /// Returns `None` when the token was cancelled first.
    async fn stream_reply(
        &self,
        state: &mut ChatState,
        history: &Conversation,
        cancel: &CancellationToken,
    ) -> Result<Option<Message>> {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                state.cancel();
                return Ok(None);
            }
            res = self.backend.stream_chat(history.messages()) => res?,
        };

        state.start_reply()?;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    state.cancel();
                    return Ok(None);
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(delta)) => state.apply_delta(&delta)?,
                Some(Err(err)) => return Err(err),
                None => break,
            }
        }

        Ok(Some(state.complete()?))
    }

    async fn persist(&self, history: &Conversation, reply: &Message) -> Result<()> {
        let user = match self
            .session
            .current_user()
            .await
            .wrap_err("getting current user")?
        {
            Some(user) => user,
            None => {
                log::debug!("anonymous session, chat is not saved");
                return Ok(());
            }
        };

        let prompt = history
            .last_message()
            .ok_or_else(|| eyre::eyre!("history is empty"))?;

        let records = vec![
            ChatRecord::new(user.id(), prompt),
            ChatRecord::new(user.id(), reply),
        ];
        self.storage
            .insert_chat_messages(&records)
            .await
            .wrap_err("saving chat messages")?;

        log::debug!("saved {} chat messages for {}", records.len(), user.id());
        if let Err(err) = self.event_tx.send(Event::ChatSaved(records.len())).await {
            log::error!("failed to send event: {}", err);
        }
        Ok(())
    }

    async fn notify_failure(&self, err: eyre::Report) -> SendOutcome {
        log::error!("chat failed: {:?}", err);
        let message = error_message(&err);
        if let Err(err) = self.event_tx.send(notice_error!(message.clone())).await {
            log::error!("failed to send event: {}", err);
        }
        SendOutcome::Failed(message)
    }
}

pub fn error_message(err: &eyre::Report) -> String {
    if let Some(err) = err.downcast_ref::<BackendError>() {
        return err.to_string();
    }
    err.chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
