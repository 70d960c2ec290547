//! Backend Traits
//!
//! Trait definitions for the two remote services. Surfaces and tests talk to
//! these traits so the HTTP clients can be swapped for in-process fakes.
//!
//! Both calls hand back a channel receiver immediately. The request itself
//! runs on a spawned task that forwards classified events and closes the
//! channel after the first terminal event. A transport failure arrives as a
//! single `Err` item, after which the channel closes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::events::{ChatEvent, UploadEvent};

/// Capacity of the per-request event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// One item of a chat stream
pub type ChatItem = Result<ChatEvent, StreamError>;

/// One item of an upload stream
pub type UploadItem = Result<UploadEvent, StreamError>;

/// Receiving half of a chat stream
pub type ChatReceiver = mpsc::Receiver<ChatItem>;

/// Receiving half of an upload stream
pub type UploadReceiver = mpsc::Receiver<UploadItem>;

/// A file queued for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Declared MIME type
    pub mime_type: String,
}

impl UploadFile {
    /// Create an upload file
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: mime_type.into(),
        }
    }
}

/// Question-answering backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Send a question and stream the answer events
    ///
    /// `query` is expected to be trimmed and non-empty.
    async fn send_query(&self, query: &str) -> ChatReceiver;
}

/// Document ingestion backend
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Upload a batch of files and stream the ingestion events
    async fn upload_files(&self, files: Vec<UploadFile>) -> UploadReceiver;
}
