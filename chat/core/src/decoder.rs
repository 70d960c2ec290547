//! Event Stream Decoder
//!
//! Turns a `text/event-stream` response body into a lazy sequence of
//! [`Event`]s. Only lines of the form `data: <json>` produce events; every
//! other line (comments, `event:` fields, keep-alive blanks) is skipped, and
//! `data:` lines whose payload is not a JSON object with a string `type` are
//! dropped without interrupting the stream.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::events::Event;

/// Prefix that marks an event line
pub const DATA_PREFIX: &str = "data: ";

/// Decode a single line of the stream
///
/// Returns `None` for lines without the `data: ` prefix and for payloads
/// that do not parse as an event.
#[must_use]
pub fn decode_line(line: &str) -> Option<Event> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<Event>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, payload = payload, "Dropping malformed event line");
            None
        }
    }
}

/// Longest line the decoder buffers before dropping it (1 MiB)
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Reassembles text lines from arbitrarily split body chunks
///
/// Bytes are buffered until a `\n` arrives, so multi-byte UTF-8 sequences
/// split across chunks are decoded intact. A trailing `\r` is stripped.
/// A line longer than the limit is dropped whole and decoding resumes at the
/// next line.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: Vec<u8>,
    max_line_bytes: usize,
    /// Skipping the rest of an over-long line
    discarding: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    /// Create an empty line buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty line buffer with a custom line length limit
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Feed a chunk, returning every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let rest = self.buffer.split_off(pos + 1);
            let raw = std::mem::replace(&mut self.buffer, rest);
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            if pos > self.max_line_bytes {
                tracing::debug!(len = pos, "Dropping over-long line");
                continue;
            }
            lines.push(Self::to_line(&raw[..pos]));
        }

        if self.buffer.len() > self.max_line_bytes {
            if !self.discarding {
                tracing::debug!(
                    limit = self.max_line_bytes,
                    "Dropping over-long line"
                );
            }
            self.buffer.clear();
            self.discarding = true;
        }
        lines
    }

    /// Take the final unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if std::mem::take(&mut self.discarding) || self.buffer.is_empty() {
            self.buffer.clear();
            return None;
        }
        let raw = std::mem::take(&mut self.buffer);
        Some(Self::to_line(&raw))
    }

    fn to_line(raw: &[u8]) -> String {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        String::from_utf8_lossy(raw).into_owned()
    }
}

struct DecodeState<S> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    pending: VecDeque<Event>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn queue_line(&mut self, line: &str) {
        if let Some(event) = decode_line(line) {
            self.pending.push_back(event);
        }
    }
}

/// Decode a byte stream into events
///
/// The returned stream is single-pass. A read error on the body (for example
/// the peer closing the connection) ends the sequence without yielding an
/// error.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Event>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = DecodeState {
        body: Box::pin(body),
        lines: LineBuffer::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for line in state.lines.push(chunk.as_ref()) {
                        state.queue_line(&line);
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Event stream interrupted");
                    state.finished = true;
                }
                None => {
                    if let Some(line) = state.lines.finish() {
                        state.queue_line(&line);
                    }
                    state.finished = true;
                }
            }
        }
    })
}

/// Decode a sequence of already-split lines
pub fn decode_lines<'a, I>(lines: I) -> impl Iterator<Item = Event> + 'a
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: 'a,
{
    lines.into_iter().filter_map(decode_line)
}
