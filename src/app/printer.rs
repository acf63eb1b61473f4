#[cfg(test)]
#[path = "printer_test.rs"]
mod tests;

use std::io::{self, Write};
use std::sync::Mutex;

use crate::chat::TranscriptObserver;
use crate::models::Conversation;

/// Writes the assistant turn to the terminal as it grows. User turns are
/// not echoed since they were just typed.
pub struct TranscriptPrinter<W: Write> {
    name: String,
    inner: Mutex<PrinterState<W>>,
}

struct PrinterState<W> {
    out: W,
    /// Index of the assistant message being printed.
    current: Option<usize>,
    /// Bytes of that message already written.
    printed: usize,
}

impl TranscriptPrinter<io::Stdout> {
    pub fn stdout(name: &str) -> Self {
        Self::new(name, io::stdout())
    }
}

impl<W: Write> TranscriptPrinter<W> {
    pub fn new(name: &str, out: W) -> Self {
        Self {
            name: name.to_string(),
            inner: Mutex::new(PrinterState {
                out,
                current: None,
                printed: 0,
            }),
        }
    }

    pub fn into_inner(self) -> W {
        match self.inner.into_inner() {
            Ok(state) => state.out,
            Err(poisoned) => poisoned.into_inner().out,
        }
    }

    fn print(&self, conversation: &Conversation) -> io::Result<()> {
        let mut state = match self.inner.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        let index = match conversation.len().checked_sub(1) {
            Some(index) => index,
            None => {
                state.current = None;
                state.printed = 0;
                return Ok(());
            }
        };

        let last = match conversation.last_message() {
            Some(last) if last.is_assistant() => last,
            _ => return Ok(()),
        };

        if state.current != Some(index) {
            state.current = Some(index);
            state.printed = 0;
            write!(state.out, "{}: ", self.name)?;
        }

        let content = last.content();
        let unseen = content.get(state.printed..).unwrap_or_default();
        state.out.write_all(unseen.as_bytes())?;
        state.printed = content.len();
        state.out.flush()
    }
}

impl<W: Write> TranscriptObserver for TranscriptPrinter<W> {
    fn on_transcript(&self, conversation: &Conversation) {
        if let Err(err) = self.print(conversation) {
            log::error!("failed to print transcript: {}", err);
        }
    }
}
