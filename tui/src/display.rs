//! Display State Types
//!
//! What the TUI draws, derived from committed turns and from the updates of
//! the streams in flight. Nothing here touches the terminal: the app turns
//! [`DisplayLine`]s into styled ratatui lines.
//!
//! - [`DisplayTurn`]: one question with its reply, committed or streaming
//! - [`DisplayUpload`]: one upload batch and its progress
//! - [`DisplayState`]: everything shown in both tabs

use ragchat_core::{
    ChatUpdate, Source, Turn, UploadState, UploadUpdate, ERROR_STATUS, UPLOAD_STARTING_LABEL,
};

/// A question and its reply as shown in the chat tab
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayTurn {
    /// The question
    pub question: String,
    /// The reply so far (with the cursor while streaming)
    pub reply: String,
    /// Latest status text
    pub status: String,
    /// Source document
    pub source: Source,
    /// Whether the reply is still streaming
    pub streaming: bool,
}

impl DisplayTurn {
    /// A turn waiting for its first update
    pub fn pending(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            reply: String::new(),
            status: String::new(),
            source: Source::None,
            streaming: true,
        }
    }

    /// A committed turn
    pub fn committed(turn: &Turn) -> Self {
        Self {
            question: turn.question.content.clone(),
            reply: turn.reply.content.clone(),
            status: turn.status.clone(),
            source: turn.source.clone(),
            streaming: false,
        }
    }

    /// Apply one chat update
    pub fn apply(&mut self, update: &ChatUpdate) {
        match update {
            ChatUpdate::Status(status) => self.status.clone_from(status),
            ChatUpdate::Reply(reply) => self.reply.clone_from(reply),
            ChatUpdate::Source(source) => self.source = source.clone(),
            ChatUpdate::Finished => self.streaming = false,
        }
    }

    fn is_error(&self) -> bool {
        self.status == ERROR_STATUS
    }
}

/// One upload batch as shown in the upload tab
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayUpload {
    /// Names of the uploaded files
    pub files: Vec<String>,
    /// Header text
    pub label: String,
    /// Overall state
    pub state: UploadState,
    /// Whether progress lines are shown
    pub expanded: bool,
    /// Progress lines
    pub lines: Vec<String>,
}

impl DisplayUpload {
    /// A batch that has just been sent
    pub fn new(files: Vec<String>) -> Self {
        Self {
            files,
            label: UPLOAD_STARTING_LABEL.to_string(),
            state: UploadState::Running,
            expanded: true,
            lines: Vec::new(),
        }
    }

    /// Apply one upload update
    pub fn apply(&mut self, update: &UploadUpdate) {
        match update {
            UploadUpdate::Progress(line) => self.lines.push(line.clone()),
            UploadUpdate::Label {
                label,
                state,
                expanded,
            } => {
                self.label.clone_from(label);
                self.state = *state;
                self.expanded = *expanded;
            }
            UploadUpdate::Finished(state) => self.state = *state,
        }
    }

    fn icon(&self) -> &'static str {
        match self.state {
            UploadState::Running => "⟳",
            UploadState::Complete => "✔",
            UploadState::Failed => "✘",
            UploadState::Ended => "•",
        }
    }
}

/// How a display line is styled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// The user's question
    User,
    /// The assistant's reply
    Assistant,
    /// Transient status text
    Status,
    /// Source document link
    Source,
    /// Anything that failed
    Error,
    /// A completed upload
    Success,
    /// A running upload
    Progress,
    /// Secondary text
    Dim,
}

/// A wrapped line ready to draw
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayLine {
    /// Text, already wrapped to the target width
    pub text: String,
    /// Style class
    pub kind: LineKind,
}

/// Everything the TUI shows
#[derive(Clone, Debug, Default)]
pub struct DisplayState {
    /// Committed turns, oldest first
    pub turns: Vec<DisplayTurn>,
    /// The turn currently streaming
    pub pending: Option<DisplayTurn>,
    /// Upload batches, oldest first
    pub uploads: Vec<DisplayUpload>,
    /// One-line notice for the status bar
    pub notification: Option<String>,
}

impl DisplayState {
    /// Create an empty display state
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a question that has just been sent
    pub fn begin_turn(&mut self, question: &str) {
        self.pending = Some(DisplayTurn::pending(question));
        self.notification = None;
    }

    /// Apply an update to the streaming turn
    pub fn apply_chat_update(&mut self, update: &ChatUpdate) {
        if let Some(turn) = self.pending.as_mut() {
            turn.apply(update);
        }
    }

    /// Replace the streaming turn with its committed form
    pub fn commit_turn(&mut self, turn: &Turn) {
        self.pending = None;
        self.turns.push(DisplayTurn::committed(turn));
    }

    /// Drop the streaming turn
    pub fn cancel_turn(&mut self) {
        if self.pending.take().is_some() {
            self.notification = Some("Question cancelled".to_string());
        }
    }

    /// Whether a reply is streaming
    pub fn is_streaming(&self) -> bool {
        self.pending.is_some()
    }

    /// Show a batch that has just been sent
    pub fn begin_upload(&mut self, files: Vec<String>) {
        self.uploads.push(DisplayUpload::new(files));
        self.notification = None;
    }

    /// Apply an update to the newest batch
    pub fn apply_upload_update(&mut self, update: &UploadUpdate) {
        if let Some(upload) = self.uploads.last_mut() {
            upload.apply(update);
        }
    }

    /// Mark the newest batch as abandoned
    pub fn cancel_upload(&mut self) {
        if let Some(upload) = self.uploads.last_mut() {
            if upload.state == UploadState::Running {
                upload.label = "Upload cancelled".to_string();
                upload.state = UploadState::Ended;
                upload.expanded = false;
            }
        }
    }

    /// Set the status bar notice
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(message.into());
    }

    /// Lines for the chat tab
    pub fn chat_lines(&self, width: usize, docs_base_url: &str) -> Vec<DisplayLine> {
        let mut lines = Vec::new();
        for turn in self.turns.iter().chain(self.pending.iter()) {
            push_wrapped(&mut lines, &format!("You: {}", turn.question), width, LineKind::User);

            if !turn.status.is_empty() {
                let kind = if turn.is_error() {
                    LineKind::Error
                } else {
                    LineKind::Status
                };
                push_wrapped(&mut lines, &format!("  · {}", turn.status), width, kind);
            }

            if !turn.reply.is_empty() || !turn.streaming {
                let kind = if turn.is_error() {
                    LineKind::Error
                } else {
                    LineKind::Assistant
                };
                push_wrapped(&mut lines, &format!("Assistant: {}", turn.reply), width, kind);
            }

            if let Some(link) = turn.source.link(docs_base_url) {
                push_wrapped(
                    &mut lines,
                    &format!("  Source: {} ({link})", turn.source),
                    width,
                    LineKind::Source,
                );
            }
            lines.push(blank());
        }
        lines
    }

    /// Lines for the upload tab
    pub fn upload_lines(&self, width: usize) -> Vec<DisplayLine> {
        let mut lines = Vec::new();
        for upload in &self.uploads {
            let kind = match upload.state {
                UploadState::Running => LineKind::Progress,
                UploadState::Complete => LineKind::Success,
                UploadState::Failed => LineKind::Error,
                UploadState::Ended => LineKind::Dim,
            };
            push_wrapped(
                &mut lines,
                &format!("{} {}", upload.icon(), upload.label),
                width,
                kind,
            );
            push_wrapped(
                &mut lines,
                &format!("  Files: {}", upload.files.join(", ")),
                width,
                LineKind::Dim,
            );
            if upload.expanded {
                for line in &upload.lines {
                    push_wrapped(&mut lines, &format!("    {line}"), width, LineKind::Dim);
                }
            }
            lines.push(blank());
        }
        lines
    }
}

fn blank() -> DisplayLine {
    DisplayLine {
        text: String::new(),
        kind: LineKind::Dim,
    }
}

fn push_wrapped(lines: &mut Vec<DisplayLine>, text: &str, width: usize, kind: LineKind) {
    for line in text.lines() {
        if line.is_empty() {
            lines.push(DisplayLine {
                text: String::new(),
                kind,
            });
            continue;
        }
        for wrapped in textwrap::wrap(line, width.max(1)) {
            lines.push(DisplayLine {
                text: wrapped.into_owned(),
                kind,
            });
        }
    }
}
