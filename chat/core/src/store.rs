//! Conversation Store
//!
//! Append-only history of committed turns for the lifetime of one process.
//!
//! The store keeps four parallel collections (questions, replies, statuses,
//! sources). Index `i` in each of them belongs to the same turn, and all four
//! grow together in [`ConversationStore::append_turn`], so their lengths are
//! always equal. There is no update or delete: a new session starts with a
//! new, empty store that the caller constructs and passes around explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::messages::{ChatMessage, Source};

/// One committed question/reply exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// The user's question
    pub question: ChatMessage,
    /// The assistant's reply (or error placeholder)
    pub reply: ChatMessage,
    /// Final status text of the stream
    pub status: String,
    /// Source document of the reply
    pub source: Source,
}

/// Session-scoped conversation history
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    questions: Vec<ChatMessage>,
    replies: Vec<ChatMessage>,
    statuses: Vec<String>,
    sources: Vec<Source>,
    committed_at: Vec<DateTime<Utc>>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn to every collection
    ///
    /// Returns the index of the new turn.
    pub fn append_turn(
        &mut self,
        question: ChatMessage,
        reply: ChatMessage,
        status: impl Into<String>,
        source: Source,
    ) -> usize {
        let index = self.questions.len();
        self.questions.push(question);
        self.replies.push(reply);
        self.statuses.push(status.into());
        self.sources.push(source);
        self.committed_at.push(Utc::now());

        tracing::debug!(index = index, "Committed conversation turn");
        index
    }

    /// Append an already assembled turn
    pub fn push(&mut self, turn: Turn) -> usize {
        self.append_turn(turn.question, turn.reply, turn.status, turn.source)
    }

    /// Number of committed turns
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.questions.len()
    }

    /// Whether no turn has been committed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Read turn `index`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IndexOutOfRange`] when `index >= turn_count()`.
    pub fn get_turn(&self, index: usize) -> Result<Turn, StoreError> {
        if index >= self.turn_count() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.turn_count(),
            });
        }

        Ok(Turn {
            question: self.questions[index].clone(),
            reply: self.replies[index].clone(),
            status: self.statuses[index].clone(),
            source: self.sources[index].clone(),
        })
    }

    /// When turn `index` was committed
    #[must_use]
    pub fn committed_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.committed_at.get(index).copied()
    }

    /// Iterate over all turns in commit order
    pub fn turns(&self) -> impl Iterator<Item = Turn> + '_ {
        (0..self.turn_count()).filter_map(|i| self.get_turn(i).ok())
    }

    /// Lengths of the four parallel collections
    ///
    /// (questions, replies, statuses, sources)
    #[must_use]
    pub fn collection_lengths(&self) -> (usize, usize, usize, usize) {
        (
            self.questions.len(),
            self.replies.len(),
            self.statuses.len(),
            self.sources.len(),
        )
    }
}
