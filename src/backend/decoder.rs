//! Incremental decoding of the chat endpoint's `data: ` event stream.

#[cfg(test)]
#[path = "decoder_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use eyre::Result;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use super::BackendError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A lazy, finite sequence of content deltas in arrival order.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, PartialEq, Eq)]
enum Frame<'a> {
    Skip,
    Done,
    Data(&'a str),
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Incomplete UTF-8 sequence left over from the last chunk.
    pending: Vec<u8>,
    buffer: String,
    started: bool,
    done: bool,
    finished: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deltas<I>(chunks: I) -> Deltas<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Deltas {
            chunks: chunks.into_iter(),
            decoder: FrameDecoder::new(),
            queue: VecDeque::new(),
        }
    }

    /// True once a `[DONE]` frame was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the content deltas of every line this chunk completes. A
    /// `[DONE]` frame ends the scan of the current chunk only; the lines
    /// after it are scanned once the next chunk arrives.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut deltas = vec![];
        if self.finished {
            return deltas;
        }

        self.decode_utf8(chunk);

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].to_string();
            self.buffer.drain(..=newline_pos);

            let line = line.strip_suffix('\r').unwrap_or(&line);
            match classify(line) {
                Frame::Skip => continue,
                Frame::Done => {
                    self.done = true;
                    break;
                }
                Frame::Data(payload) => match parse_delta(payload) {
                    Ok(Some(delta)) => deltas.push(delta),
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("skipping malformed frame: {}: {}", err, payload);
                    }
                },
            }
        }

        deltas
    }

    /// Returns whatever is left unscanned in the buffer. It is never parsed.
    pub fn finish(&mut self) -> Option<String> {
        self.finished = true;
        self.pending.clear();

        let tail = std::mem::take(&mut self.buffer);
        if tail.is_empty() {
            return None;
        }
        log::debug!("discarding unscanned input: {}", tail);
        Some(tail)
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut input = bytes.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }
        self.pending = input.to_vec();

        if !self.started && !self.buffer.is_empty() {
            self.started = true;
            if let Some(rest) = self.buffer.strip_prefix('\u{FEFF}') {
                self.buffer = rest.to_string();
            }
        }
    }
}

fn classify(line: &str) -> Frame<'_> {
    if line.starts_with(':') || line.trim().is_empty() {
        return Frame::Skip;
    }

    let payload = match line.strip_prefix(DATA_PREFIX) {
        Some(payload) => payload.trim(),
        None => return Frame::Skip,
    };

    if payload == DONE_SENTINEL {
        Frame::Done
    } else {
        Frame::Data(payload)
    }
}

fn parse_delta(payload: &str) -> serde_json::Result<Option<String>> {
    let data = serde_json::from_str::<CompletionResponse>(payload)?;
    let content = data
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());
    Ok(content)
}

pub struct Deltas<I> {
    chunks: I,
    decoder: FrameDecoder,
    queue: VecDeque<String>,
}

impl<I> Iterator for Deltas<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(delta) = self.queue.pop_front() {
                return Some(delta);
            }
            if self.decoder.is_finished() {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => {
                    let deltas = self.decoder.feed(chunk.as_ref());
                    self.queue.extend(deltas);
                }
                None => {
                    self.decoder.finish();
                    return None;
                }
            }
        }
    }
}

struct StreamState<S> {
    body: Pin<Box<S>>,
    decoder: FrameDecoder,
    queue: VecDeque<String>,
    idle_timeout: Option<Duration>,
}

/// A read error or an expired `idle_timeout` is yielded once and ends the
/// stream.
pub fn decode_stream<S, B, E>(body: S, idle_timeout: Option<Duration>) -> DeltaStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = StreamState {
        body: Box::pin(body),
        decoder: FrameDecoder::new(),
        queue: VecDeque::new(),
        idle_timeout,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.queue.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.decoder.is_finished() {
                return None;
            }

            let next = match state.idle_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, state.body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        state.decoder.finish();
                        return Some((Err(BackendError::IdleTimeout(timeout).into()), state));
                    }
                },
                None => state.body.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    let deltas = state.decoder.feed(chunk.as_ref());
                    state.queue.extend(deltas);
                }
                Some(Err(err)) => {
                    state.decoder.finish();
                    let err = eyre::Report::new(err).wrap_err("reading response body");
                    return Some((Err(err), state));
                }
                None => {
                    state.decoder.finish();
                    return None;
                }
            }
        }
    });

    Box::pin(stream)
}

#[derive(Default, Debug, Serialize, Deserialize)]
pub(crate) struct CompletionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) choices: Option<Vec<CompletionChoiceResponse>>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
pub(crate) struct CompletionChoiceResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) delta: Option<CompletionDeltaResponse>,
}

#[derive(Default, Debug, Serialize, Deserialize)]
pub(crate) struct CompletionDeltaResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
}
