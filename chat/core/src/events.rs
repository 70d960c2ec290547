//! Stream Events
//!
//! Events decoded from the `text/event-stream` bodies of the chat and upload
//! endpoints. Every event on the wire is a JSON object of the form
//! `{"type": <tag>, "data": <payload>}`; the payload shape depends on the tag.
//!
//! # Design Philosophy
//!
//! The decoder produces an untyped [`Event`] for every well-formed line. The
//! chat and upload clients then classify it into [`ChatEvent`] or
//! [`UploadEvent`], which carry the terminal-tag policy of their stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded server event, before classification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The `type` tag
    #[serde(rename = "type")]
    pub kind: String,
    /// The payload (absent on the wire becomes `null`)
    #[serde(default)]
    pub data: Value,
}

impl Event {
    /// Create an event from a tag and payload
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Render the payload for display
    ///
    /// String payloads are returned without JSON quoting; `null` renders as
    /// an empty string; anything else is rendered as compact JSON.
    #[must_use]
    pub fn data_text(&self) -> String {
        payload_text(&self.data)
    }
}

/// Render a JSON payload as display text
#[must_use]
pub fn payload_text(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A stream-specific classification of [`Event`]
///
/// Implemented by [`ChatEvent`] and [`UploadEvent`]; the streaming clients
/// use it to decide when to stop reading the response body.
pub trait ClassifiedEvent: From<Event> + Send + 'static {
    /// Whether receiving this event ends the stream
    fn is_terminal(&self) -> bool;

    /// The wire tag of this event
    fn tag(&self) -> &str;
}

// ============================================================================
// Chat Events
// ============================================================================

/// Chat tag: the document the answer was retrieved from
pub const TAG_SOURCE: &str = "source";
/// Chat tag: progress status text
pub const TAG_STATUS: &str = "status";
/// Chat tag: retrieval failed on the server
pub const TAG_RETRIEVAL_ERROR: &str = "retrieval_error";
/// Chat tag: generation failed on the server
pub const TAG_GENERATION_ERROR: &str = "generation_error";
/// Chat tag: a fragment of the answer
pub const TAG_ANSWER_PART: &str = "answer_part";
/// Chat tag: the answer is complete
pub const TAG_DONE: &str = "done";

/// A classified chat event
#[derive(Clone, Debug, PartialEq)]
pub enum ChatEvent {
    /// Source document identifier for the answer
    Source(String),
    /// Status text to show while the answer is produced
    Status(String),
    /// Server-side retrieval failure (terminal)
    RetrievalError(String),
    /// Server-side generation failure (terminal)
    GenerationError(String),
    /// A fragment of the answer text
    AnswerPart(String),
    /// Answer complete (terminal)
    Done,
    /// A tag this client does not know; never terminal
    Unknown(Event),
}

impl ClassifiedEvent for ChatEvent {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::RetrievalError(_) | Self::GenerationError(_)
        )
    }

    fn tag(&self) -> &str {
        match self {
            Self::Source(_) => TAG_SOURCE,
            Self::Status(_) => TAG_STATUS,
            Self::RetrievalError(_) => TAG_RETRIEVAL_ERROR,
            Self::GenerationError(_) => TAG_GENERATION_ERROR,
            Self::AnswerPart(_) => TAG_ANSWER_PART,
            Self::Done => TAG_DONE,
            Self::Unknown(event) => &event.kind,
        }
    }
}

impl From<Event> for ChatEvent {
    fn from(event: Event) -> Self {
        match event.kind.as_str() {
            TAG_SOURCE => Self::Source(event.data_text()),
            TAG_STATUS => Self::Status(event.data_text()),
            TAG_RETRIEVAL_ERROR => Self::RetrievalError(event.data_text()),
            TAG_GENERATION_ERROR => Self::GenerationError(event.data_text()),
            TAG_ANSWER_PART => Self::AnswerPart(event.data_text()),
            TAG_DONE => Self::Done,
            _ => Self::Unknown(event),
        }
    }
}

// ============================================================================
// Upload Events
// ============================================================================

/// Upload tag: a status line from the ingestion pipeline
pub const TAG_UPLOAD_STATUS: &str = "upload_status";
/// Upload tag: a task started by the ingestion pipeline
pub const TAG_UPLOAD_TASK: &str = "upload_task";
/// Upload tag: every file was ingested
pub const TAG_UPLOAD_DONE: &str = "upload_done";
/// Upload tag: ingestion failed
pub const TAG_UPLOAD_FAILED: &str = "upload_failed";

/// Tags that keep an upload stream open. Everything else ends it.
pub const UPLOAD_PROGRESS_TAGS: &[&str] = &[TAG_UPLOAD_STATUS, TAG_UPLOAD_TASK];

/// Whether a tag belongs to the upload progress set
#[must_use]
pub fn is_upload_progress_tag(tag: &str) -> bool {
    UPLOAD_PROGRESS_TAGS.contains(&tag)
}

/// A classified upload event
#[derive(Clone, Debug, PartialEq)]
pub enum UploadEvent {
    /// Progress status line
    Status(String),
    /// Progress task line
    Task(String),
    /// Upload finished successfully (terminal)
    Done(String),
    /// Upload failed (terminal)
    Failed(String),
    /// Any other tag; terminal by exclusion from the progress set
    Other(Event),
}

impl ClassifiedEvent for UploadEvent {
    fn is_terminal(&self) -> bool {
        !is_upload_progress_tag(self.tag())
    }

    fn tag(&self) -> &str {
        match self {
            Self::Status(_) => TAG_UPLOAD_STATUS,
            Self::Task(_) => TAG_UPLOAD_TASK,
            Self::Done(_) => TAG_UPLOAD_DONE,
            Self::Failed(_) => TAG_UPLOAD_FAILED,
            Self::Other(event) => &event.kind,
        }
    }
}

impl UploadEvent {
    /// Payload rendered for display
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Status(text) | Self::Task(text) | Self::Done(text) | Self::Failed(text) => {
                text.clone()
            }
            Self::Other(event) => event.data_text(),
        }
    }
}

impl From<Event> for UploadEvent {
    fn from(event: Event) -> Self {
        match event.kind.as_str() {
            TAG_UPLOAD_STATUS => Self::Status(event.data_text()),
            TAG_UPLOAD_TASK => Self::Task(event.data_text()),
            TAG_UPLOAD_DONE => Self::Done(event.data_text()),
            TAG_UPLOAD_FAILED => Self::Failed(event.data_text()),
            _ => Self::Other(event),
        }
    }
}
