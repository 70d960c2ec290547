//! Plain-text rendering for line-oriented terminals
//!
//! Renderers return the text to write instead of writing it, so the async
//! main loop owns all output.

use ragchat_core::{ChatUpdate, ConversationStore, Turn, UploadState, UploadUpdate, CURSOR};

/// Turns chat updates into incremental terminal output
///
/// Reply updates carry the whole reply so far; only the new suffix is
/// printed. A reply that does not extend what was printed (an error
/// placeholder) starts on a fresh line.
#[derive(Debug)]
pub struct ChatPrinter {
    printed: String,
    at_line_start: bool,
}

impl Default for ChatPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPrinter {
    pub fn new() -> Self {
        Self {
            printed: String::new(),
            at_line_start: true,
        }
    }

    pub fn render(&mut self, update: &ChatUpdate) -> Option<String> {
        match update {
            ChatUpdate::Status(status) => {
                let mut out = self.break_line();
                out.push_str(&format!("[{status}]\n"));
                self.at_line_start = true;
                Some(out)
            }
            ChatUpdate::Reply(text) => {
                let text = text.strip_suffix(CURSOR).unwrap_or(text);
                let out = match text.strip_prefix(self.printed.as_str()) {
                    Some(delta) => delta.to_string(),
                    None => {
                        let mut out = self.break_line();
                        out.push_str(text);
                        out
                    }
                };
                self.printed = text.to_string();
                if out.is_empty() {
                    return None;
                }
                self.at_line_start = out.ends_with('\n');
                Some(out)
            }
            ChatUpdate::Source(_) => None,
            ChatUpdate::Finished => {
                let out = self.break_line();
                self.at_line_start = true;
                (!out.is_empty()).then_some(out)
            }
        }
    }

    fn break_line(&self) -> String {
        if self.at_line_start {
            String::new()
        } else {
            "\n".to_string()
        }
    }
}

/// Turns upload updates into progress lines
#[derive(Debug, Default)]
pub struct UploadPrinter;

impl UploadPrinter {
    pub fn render(&self, update: &UploadUpdate) -> Option<String> {
        match update {
            UploadUpdate::Progress(line) => Some(format!("  {line}\n")),
            // Running labels repeat the progress line written with them
            UploadUpdate::Label {
                state: UploadState::Running,
                ..
            } => None,
            UploadUpdate::Label { label, state, .. } => {
                Some(format!("{}: {label}\n", state.description()))
            }
            UploadUpdate::Finished(UploadState::Ended) => {
                Some("Upload stream ended without a result\n".to_string())
            }
            UploadUpdate::Finished(_) => None,
        }
    }
}

/// Source line printed under a reply, if the turn has a source
pub fn source_line(turn: &Turn, docs_base_url: &str) -> Option<String> {
    turn.source
        .link(docs_base_url)
        .map(|link| format!("Source: {} ({link})\n", turn.source))
}

/// Commit time of a turn as `HH:MM:SS` (UTC)
fn commit_time(store: &ConversationStore, index: usize) -> String {
    store
        .committed_at(index)
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// The whole history, oldest turn first
pub fn format_history(store: &ConversationStore, docs_base_url: &str) -> String {
    if store.is_empty() {
        return "No questions asked yet.\n".to_string();
    }

    let mut out = String::new();
    for (i, turn) in store.turns().enumerate() {
        out.push_str(&format!(
            "#{} [{}] You: {}\n",
            i + 1,
            commit_time(store, i),
            turn.question.content
        ));
        out.push_str(&format!("   Assistant: {}\n", turn.reply.content));
        if !turn.status.is_empty() {
            out.push_str(&format!("   Status: {}\n", turn.status));
        }
        if let Some(line) = source_line(&turn, docs_base_url) {
            out.push_str("   ");
            out.push_str(&line);
        }
    }
    out
}
