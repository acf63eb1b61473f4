use std::sync::Arc;

use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::TranscriptPrinter;
use crate::backend::ArcBackend;
use crate::chat::{ChatService, ChatState, SendOutcome};
use crate::config::Configuration;
use crate::config::constants::{CLEAR_COMMAND, QUIT_COMMAND};
use crate::models::{ChatRecordFilter, Event, NoticeMessage};
use crate::session::ArcSession;
use crate::storage::ArcStorage;

pub struct InitProps {
    pub backend: ArcBackend,
    pub storage: ArcStorage,
    pub session: ArcSession,
}

/// Line-based chat front end. Replies are streamed to stdout while notices
/// go to stderr.
pub struct App {
    name: String,
    greeting: Option<String>,
    service: ChatService,
    state: ChatState,
    storage: ArcStorage,
    session: ArcSession,
    event_rx: mpsc::UnboundedReceiver<Event>,
}

impl App {
    pub fn new(props: InitProps) -> Self {
        let config = Configuration::instance();
        let name = props.backend.name().to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        let service = ChatService::new(
            props.backend,
            props.storage.clone(),
            props.session.clone(),
            Arc::new(event_tx),
        );

        let mut state = ChatState::new();
        state.add_observer(Arc::new(TranscriptPrinter::stdout(&name)));

        Self {
            name,
            greeting: config.general.greeting.clone(),
            service,
            state,
            storage: props.storage,
            session: props.session,
            event_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        if let Some(greeting) = self.greeting.as_deref() {
            println!("{}: {}", self.name, greeting);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line.wrap_err("reading input")?,
                _ = tokio::signal::ctrl_c() => None,
            };

            let line = match line {
                Some(line) => line,
                None => break,
            };

            match line.trim() {
                QUIT_COMMAND => break,
                CLEAR_COMMAND => {
                    match self.state.clear() {
                        Ok(()) => print_notice(&NoticeMessage::info("Started a new conversation")),
                        Err(err) => print_notice(&NoticeMessage::warning(err.to_string())),
                    }
                }
                "" => continue,
                text => {
                    let text = text.to_string();
                    self.send(&text).await;
                }
            }
        }
        Ok(())
    }

    /// Sends one message, waits for the full reply and returns an error if
    /// it did not complete.
    pub async fn send_once(&mut self, text: &str) -> Result<()> {
        match self.send(text).await {
            SendOutcome::Completed(_) => Ok(()),
            SendOutcome::Rejected(err) => Err(err.into()),
            SendOutcome::Failed(message) => Err(eyre::eyre!(message)),
            SendOutcome::Cancelled => Err(eyre::eyre!("reply cancelled")),
        }
    }

    pub async fn print_history(&self) -> Result<()> {
        let user = self.session.require_user().await?;
        let records = self
            .storage
            .get_chat_messages(ChatRecordFilter::default().with_user_id(user.id()))
            .await
            .wrap_err("getting chat history")?;

        if records.is_empty() {
            println!("No messages yet.");
            return Ok(());
        }

        for record in records {
            println!(
                "[{}] {}: {}",
                record
                    .created_at()
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M"),
                record.role(),
                record.content()
            );
        }
        Ok(())
    }

    async fn send(&mut self, text: &str) -> SendOutcome {
        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel();
                }
            })
        };

        let outcome = self.service.send(&mut self.state, text, token).await;
        watcher.abort();

        match &outcome {
            SendOutcome::Completed(_) => println!(),
            SendOutcome::Cancelled => {
                println!();
                print_notice(&NoticeMessage::info("Reply cancelled"));
            }
            SendOutcome::Failed(_) => {
                if self
                    .state
                    .conversation()
                    .last_message()
                    .is_some_and(|m| m.is_assistant())
                {
                    println!();
                }
            }
            SendOutcome::Rejected(err) => log::debug!("input ignored: {}", err),
        }

        self.drain_events();
        outcome
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                Event::Notice(notice) => print_notice(&notice),
                Event::ChatSaved(count) => log::debug!("{} chat messages saved", count),
            }
        }
    }
}

fn print_notice(notice: &NoticeMessage) {
    eprintln!("{}: {}", notice.kind().title(), notice.message());
}
