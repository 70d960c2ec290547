//! Conversation Messages
//!
//! The value types that make up a committed turn: role-tagged messages and
//! the source document reference attached to an answer.

use serde::{Deserialize, Serialize};

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Remote assistant
    Assistant,
}

impl MessageRole {
    /// Lowercase role name as used by chat surfaces
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A role-tagged message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Literal used on the wire and in history for "no source"
pub const NO_SOURCE: &str = "none";

/// The document an answer was retrieved from
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    /// No source document
    #[default]
    None,
    /// A document identifier known to the ingestion service
    Document(String),
}

impl Source {
    /// Parse a source identifier; `"none"` and the empty string mean no source
    pub fn parse(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() || value == NO_SOURCE {
            Self::None
        } else {
            Self::Document(value)
        }
    }

    /// The identifier, or `"none"`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => NO_SOURCE,
            Self::Document(id) => id,
        }
    }

    /// Whether a source document is attached
    #[must_use]
    pub fn is_some(&self) -> bool {
        matches!(self, Self::Document(_))
    }

    /// Link to the document on the docs service
    #[must_use]
    pub fn link(&self, docs_base_url: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::Document(id) => Some(format!(
                "{}/api/v1/docs/{id}",
                docs_base_url.trim_end_matches('/')
            )),
        }
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Self::parse(value)
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.as_str().to_string()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
