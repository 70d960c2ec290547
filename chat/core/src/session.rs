//! Stream Session
//!
//! The ephemeral state of one chat request: the question, the answer text
//! accumulated so far, the latest status and the pending source. A session
//! lives exactly as long as its stream and becomes one [`Turn`] when the
//! stream ends; a cancelled session is simply dropped.

use crate::messages::{ChatMessage, Source};
use crate::store::{ConversationStore, Turn};

/// Status recorded for any failed stream (the misspelling is the wire text)
pub const ERROR_STATUS: &str = "An error occured";

/// Reply recorded when the server reports a retrieval or generation error
pub const SERVER_ERROR_REPLY: &str = "Server Error";

/// Accumulated state of an in-flight chat stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamSession {
    question: String,
    answer: String,
    status: String,
    source: Source,
    errored: bool,
    finished: bool,
}

impl StreamSession {
    /// Start a session for `question`
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: String::new(),
            status: String::new(),
            source: Source::None,
            errored: false,
            finished: false,
        }
    }

    /// The question being answered
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Answer text accumulated so far
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Latest status text
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Pending source
    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Whether the stream ended in an error
    #[must_use]
    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append an answer fragment
    pub fn append_answer(&mut self, text: &str) {
        self.answer.push_str(text);
    }

    /// Replace the status text
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Set the pending source
    pub fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    /// End the stream normally
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// End the stream with a server-reported error
    pub fn fail_remote(&mut self) {
        self.status = ERROR_STATUS.to_string();
        self.answer = SERVER_ERROR_REPLY.to_string();
        self.errored = true;
        self.finished = true;
    }

    /// End the stream with a local transport error
    pub fn fail_transport(&mut self, description: &str) {
        self.status = ERROR_STATUS.to_string();
        self.answer = format!("Error: {description}");
        self.errored = true;
        self.finished = true;
    }

    /// Convert into the turn to commit
    #[must_use]
    pub fn into_turn(self) -> Turn {
        Turn {
            question: ChatMessage::user(self.question),
            reply: ChatMessage::assistant(self.answer),
            status: self.status,
            source: self.source,
        }
    }

    /// Commit this session as one turn
    pub fn commit(self, store: &mut ConversationStore) -> usize {
        store.push(self.into_turn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = StreamSession::new("Hi");
        assert_eq!(session.question(), "Hi");
        assert_eq!(session.answer(), "");
        assert_eq!(session.status(), "");
        assert_eq!(session.source(), &Source::None);
        assert!(!session.is_finished());
    }

    #[test]
    fn test_remote_failure_replaces_answer() {
        let mut session = StreamSession::new("Hi");
        session.append_answer("partial");
        session.fail_remote();
        assert_eq!(session.answer(), SERVER_ERROR_REPLY);
        assert_eq!(session.status(), ERROR_STATUS);
        assert!(session.is_errored());
        assert!(session.is_finished());
    }

    #[test]
    fn test_transport_failure_describes_error() {
        let mut session = StreamSession::new("Hi");
        session.fail_transport("connection refused");
        assert_eq!(session.answer(), "Error: connection refused");
        assert_eq!(session.status(), ERROR_STATUS);
    }

    #[test]
    fn test_commit_appends_one_turn() {
        let mut store = ConversationStore::new();
        let mut session = StreamSession::new("Q");
        session.set_status("thinking");
        session.append_answer("A");
        session.set_source(Source::parse("doc.pdf"));
        session.finish();

        let index = session.commit(&mut store);
        assert_eq!(index, 0);
        let turn = store.get_turn(0).unwrap();
        assert_eq!(turn.question, ChatMessage::user("Q"));
        assert_eq!(turn.reply, ChatMessage::assistant("A"));
        assert_eq!(turn.status, "thinking");
        assert_eq!(turn.source.as_str(), "doc.pdf");
    }
}
