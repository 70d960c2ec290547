//! UI Reconciliation
//!
//! Maps stream items onto session state and display updates. Surfaces feed
//! every item they receive into a reconciler and render the returned
//! updates; they hold no protocol logic of their own.
//!
//! # Chat
//!
//! | Item                 | Session                       | Display                      |
//! |----------------------|-------------------------------|------------------------------|
//! | `source`             | pending source                | -                            |
//! | `status`             | status = payload              | status                       |
//! | `answer_part`        | append payload                | reply + cursor               |
//! | `done`               | finished                      | reply, end                   |
//! | `*_error`            | error status, placeholder     | payload as status, end       |
//! | transport error      | error status, `Error: ...`    | error status + reply, end    |
//!
//! # Upload
//!
//! | Item            | State                  | Display                        |
//! |-----------------|------------------------|--------------------------------|
//! | `upload_task`   | running, expanded      | label + progress line          |
//! | `upload_status` | running                | progress line                  |
//! | `upload_done`   | complete, collapsed    | label, end                     |
//! | `upload_failed` | failed, collapsed      | label, end                     |
//! | other tag       | ended                  | payload, end                   |
//! | transport error | failed, collapsed      | error label, end               |

use crate::backend::{ChatItem, UploadItem};
use crate::error::StreamError;
use crate::events::{ChatEvent, UploadEvent};
use crate::messages::Source;
use crate::session::{StreamSession, ERROR_STATUS, SERVER_ERROR_REPLY};
use crate::store::ConversationStore;

/// Marker drawn after a reply that is still streaming
pub const CURSOR: &str = "▌";

/// Label shown before the first upload event
pub const UPLOAD_STARTING_LABEL: &str = "Uploading documents...";

// ============================================================================
// Chat
// ============================================================================

/// A transient display change for the in-flight chat turn
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatUpdate {
    /// Replace the status line
    Status(String),
    /// Replace the reply body
    Reply(String),
    /// A source document was attached
    Source(Source),
    /// The stream ended; the turn is ready to commit
    Finished,
}

/// Trim a raw input line into a query, rejecting blank input
#[must_use]
pub fn prepare_query(input: &str) -> Option<String> {
    let query = input.trim();
    (!query.is_empty()).then(|| query.to_string())
}

/// Applies chat stream items to a [`StreamSession`]
#[derive(Clone, Debug)]
pub struct ChatReconciler {
    session: StreamSession,
    events_applied: usize,
}

impl ChatReconciler {
    /// Start reconciling a stream for `question`
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            session: StreamSession::new(question),
            events_applied: 0,
        }
    }

    /// The session accumulated so far
    #[must_use]
    pub fn session(&self) -> &StreamSession {
        &self.session
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Number of server events applied
    #[must_use]
    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    /// Apply one stream item
    pub fn apply(&mut self, item: ChatItem) -> Vec<ChatUpdate> {
        match item {
            Ok(event) => self.apply_event(event),
            Err(error) => self.apply_error(&error),
        }
    }

    /// Apply a server event
    ///
    /// Events arriving after the stream ended are ignored.
    pub fn apply_event(&mut self, event: ChatEvent) -> Vec<ChatUpdate> {
        if self.is_finished() {
            tracing::debug!(tag = ?event, "Ignoring chat event after stream end");
            return Vec::new();
        }
        self.events_applied += 1;

        match event {
            ChatEvent::Source(source) => {
                let source = Source::parse(source);
                self.session.set_source(source.clone());
                vec![ChatUpdate::Source(source)]
            }
            ChatEvent::Status(status) => {
                self.session.set_status(status.clone());
                vec![ChatUpdate::Status(status)]
            }
            ChatEvent::RetrievalError(detail) | ChatEvent::GenerationError(detail) => {
                tracing::warn!(detail = %detail, "Server reported an error");
                self.session.fail_remote();
                vec![
                    ChatUpdate::Status(detail),
                    ChatUpdate::Reply(SERVER_ERROR_REPLY.to_string()),
                    ChatUpdate::Finished,
                ]
            }
            ChatEvent::AnswerPart(text) => {
                self.session.append_answer(&text);
                vec![ChatUpdate::Reply(format!("{}{CURSOR}", self.session.answer()))]
            }
            ChatEvent::Done => {
                self.session.finish();
                vec![
                    ChatUpdate::Reply(self.session.answer().to_string()),
                    ChatUpdate::Finished,
                ]
            }
            ChatEvent::Unknown(event) => {
                tracing::debug!(tag = %event.kind, "Ignoring unknown chat event");
                Vec::new()
            }
        }
    }

    /// Apply a transport error
    pub fn apply_error(&mut self, error: &StreamError) -> Vec<ChatUpdate> {
        if self.is_finished() {
            return Vec::new();
        }
        self.session.fail_transport(&error.to_string());
        vec![
            ChatUpdate::Status(ERROR_STATUS.to_string()),
            ChatUpdate::Reply(self.session.answer().to_string()),
            ChatUpdate::Finished,
        ]
    }

    /// The stream closed; end it if no terminal item arrived
    pub fn close(&mut self) -> Vec<ChatUpdate> {
        if self.is_finished() {
            return Vec::new();
        }
        tracing::debug!("Chat stream closed without a terminal event");
        self.session.finish();
        vec![
            ChatUpdate::Reply(self.session.answer().to_string()),
            ChatUpdate::Finished,
        ]
    }

    /// Commit the session as one turn
    pub fn commit(self, store: &mut ConversationStore) -> usize {
        self.session.commit(store)
    }
}

// ============================================================================
// Upload
// ============================================================================

/// Overall state of an upload batch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadState {
    /// Waiting for more progress
    Running,
    /// Every file was ingested
    Complete,
    /// The server or the transport reported a failure
    Failed,
    /// The stream ended without a success or failure report
    Ended,
}

impl UploadState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Ended => "Ended",
        }
    }
}

/// A display change for the upload progress view
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadUpdate {
    /// Write a line under the progress view
    Progress(String),
    /// Update the progress header
    Label {
        /// Header text
        label: String,
        /// Overall state
        state: UploadState,
        /// Whether the progress lines are shown
        expanded: bool,
    },
    /// The stream ended in this state
    Finished(UploadState),
}

/// Tracks the progress view of one upload batch
#[derive(Clone, Debug)]
pub struct UploadReconciler {
    label: String,
    state: UploadState,
    expanded: bool,
    lines: Vec<String>,
    events_applied: usize,
    finished: bool,
}

impl Default for UploadReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadReconciler {
    /// Start tracking a new batch
    #[must_use]
    pub fn new() -> Self {
        Self {
            label: UPLOAD_STARTING_LABEL.to_string(),
            state: UploadState::Running,
            expanded: true,
            lines: Vec::new(),
            events_applied: 0,
            finished: false,
        }
    }

    /// Header text
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Overall state
    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state
    }

    /// Whether progress lines are shown
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Progress lines written so far
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of server events applied
    #[must_use]
    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one stream item
    pub fn apply(&mut self, item: UploadItem) -> Vec<UploadUpdate> {
        match item {
            Ok(event) => self.apply_event(event),
            Err(error) => self.apply_error(&error),
        }
    }

    /// Apply a server event
    ///
    /// Events arriving after the stream ended are ignored.
    pub fn apply_event(&mut self, event: UploadEvent) -> Vec<UploadUpdate> {
        if self.finished {
            return Vec::new();
        }
        self.events_applied += 1;

        match event {
            UploadEvent::Task(text) => {
                let mut updates = self.set_label(text.clone(), UploadState::Running, true);
                updates.push(self.write(text));
                updates
            }
            UploadEvent::Status(text) => vec![self.write(text)],
            UploadEvent::Done(text) => self.end(text, UploadState::Complete, false),
            UploadEvent::Failed(text) => self.end(text, UploadState::Failed, false),
            UploadEvent::Other(event) => {
                tracing::debug!(tag = %event.kind, "Unrecognised upload event ends the stream");
                let update = self.write(event.data_text());
                self.finished = true;
                self.state = UploadState::Ended;
                vec![update, UploadUpdate::Finished(UploadState::Ended)]
            }
        }
    }

    /// Apply a transport error
    pub fn apply_error(&mut self, error: &StreamError) -> Vec<UploadUpdate> {
        if self.finished {
            return Vec::new();
        }
        self.end(error.to_string(), UploadState::Failed, false)
    }

    /// The stream closed; end it if no terminal item arrived
    pub fn close(&mut self) -> Vec<UploadUpdate> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        self.state = UploadState::Ended;
        vec![UploadUpdate::Finished(UploadState::Ended)]
    }

    fn write(&mut self, line: String) -> UploadUpdate {
        self.lines.push(line.clone());
        UploadUpdate::Progress(line)
    }

    fn set_label(&mut self, label: String, state: UploadState, expanded: bool) -> Vec<UploadUpdate> {
        self.label = label.clone();
        self.state = state;
        self.expanded = expanded;
        vec![UploadUpdate::Label {
            label,
            state,
            expanded,
        }]
    }

    fn end(&mut self, label: String, state: UploadState, expanded: bool) -> Vec<UploadUpdate> {
        let mut updates = self.set_label(label, state, expanded);
        self.finished = true;
        updates.push(UploadUpdate::Finished(state));
        updates
    }
}
