//! Stream Drivers
//!
//! Pair a backend receiver with a reconciler so surfaces can drive a stream
//! without touching protocol details.
//!
//! Interactive surfaces poll once per frame:
//!
//! ```ignore
//! let mut chat = ActiveChat::start(&backend, &query).await;
//! loop {
//!     for update in chat.poll() {
//!         render(update);
//!     }
//!     if chat.is_finished() {
//!         chat.finish(&mut store);
//!         break;
//!     }
//! }
//! ```
//!
//! Line-oriented surfaces use [`run_chat`] and [`run_upload`] instead.

use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::{ChatBackend, ChatReceiver, UploadBackend, UploadFile, UploadReceiver};
use crate::reconcile::{
    prepare_query, ChatReconciler, ChatUpdate, UploadReconciler, UploadState, UploadUpdate,
};
use crate::session::StreamSession;
use crate::store::ConversationStore;

// ============================================================================
// Chat
// ============================================================================

/// An in-flight chat stream
pub struct ActiveChat {
    reconciler: ChatReconciler,
    rx: ChatReceiver,
}

impl ActiveChat {
    /// Send `query` to the backend and start tracking its stream
    pub async fn start<B: ChatBackend + ?Sized>(backend: &B, query: &str) -> Self {
        tracing::debug!(backend = backend.name(), "Starting chat stream");
        let rx = backend.send_query(query).await;
        Self::from_receiver(query, rx)
    }

    /// Track an already opened stream
    pub fn from_receiver(question: impl Into<String>, rx: ChatReceiver) -> Self {
        Self {
            reconciler: ChatReconciler::new(question),
            rx,
        }
    }

    /// Drain every item available without waiting
    pub fn poll(&mut self) -> Vec<ChatUpdate> {
        let mut updates = Vec::new();
        while !self.reconciler.is_finished() {
            match self.rx.try_recv() {
                Ok(item) => updates.extend(self.reconciler.apply(item)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => updates.extend(self.reconciler.close()),
            }
        }
        updates
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the stream has ended.
    pub async fn next_updates(&mut self) -> Option<Vec<ChatUpdate>> {
        if self.reconciler.is_finished() {
            return None;
        }
        Some(match self.rx.recv().await {
            Some(item) => self.reconciler.apply(item),
            None => self.reconciler.close(),
        })
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reconciler.is_finished()
    }

    /// The session accumulated so far
    #[must_use]
    pub fn session(&self) -> &StreamSession {
        self.reconciler.session()
    }

    /// Commit the finished stream as one turn
    ///
    /// Commits nothing and returns `None` if the stream has not ended.
    pub fn finish(self, store: &mut ConversationStore) -> Option<usize> {
        if !self.reconciler.is_finished() {
            tracing::warn!("Chat stream finished before it ended, discarding");
            return None;
        }
        let index = self.reconciler.commit(store);
        tracing::debug!(turn = index, "Committed chat turn");
        Some(index)
    }

    /// Abandon the stream without committing anything
    pub fn cancel(self) {
        tracing::info!(
            answered = self.reconciler.session().answer().len(),
            "Chat stream cancelled"
        );
    }
}

/// Ask a question and drive the stream to completion
///
/// Blank input is rejected without contacting the backend. Returns the index
/// of the committed turn.
pub async fn run_chat<B, F>(
    backend: &B,
    store: &mut ConversationStore,
    input: &str,
    mut on_update: F,
) -> Option<usize>
where
    B: ChatBackend + ?Sized,
    F: FnMut(&ChatUpdate),
{
    let query = prepare_query(input)?;
    let mut chat = ActiveChat::start(backend, &query).await;
    while let Some(updates) = chat.next_updates().await {
        for update in &updates {
            on_update(update);
        }
    }
    chat.finish(store)
}

// ============================================================================
// Upload
// ============================================================================

/// An in-flight upload stream
pub struct ActiveUpload {
    reconciler: UploadReconciler,
    rx: UploadReceiver,
}

impl ActiveUpload {
    /// Send `files` to the backend and start tracking progress
    pub async fn start<B: UploadBackend + ?Sized>(backend: &B, files: Vec<UploadFile>) -> Self {
        tracing::debug!(backend = backend.name(), count = files.len(), "Starting upload stream");
        let rx = backend.upload_files(files).await;
        Self::from_receiver(rx)
    }

    /// Track an already opened stream
    #[must_use]
    pub fn from_receiver(rx: UploadReceiver) -> Self {
        Self {
            reconciler: UploadReconciler::new(),
            rx,
        }
    }

    /// Drain every item available without waiting
    pub fn poll(&mut self) -> Vec<UploadUpdate> {
        let mut updates = Vec::new();
        while !self.reconciler.is_finished() {
            match self.rx.try_recv() {
                Ok(item) => updates.extend(self.reconciler.apply(item)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => updates.extend(self.reconciler.close()),
            }
        }
        updates
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the stream has ended.
    pub async fn next_updates(&mut self) -> Option<Vec<UploadUpdate>> {
        if self.reconciler.is_finished() {
            return None;
        }
        Some(match self.rx.recv().await {
            Some(item) => self.reconciler.apply(item),
            None => self.reconciler.close(),
        })
    }

    /// Whether the stream has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.reconciler.is_finished()
    }

    /// Progress view state
    #[must_use]
    pub fn progress(&self) -> &UploadReconciler {
        &self.reconciler
    }

    /// Abandon the stream
    pub fn cancel(self) {
        tracing::info!(
            events = self.reconciler.events_applied(),
            "Upload stream cancelled"
        );
    }
}

/// Upload a batch and drive the stream to completion
pub async fn run_upload<B, F>(backend: &B, files: Vec<UploadFile>, mut on_update: F) -> UploadState
where
    B: UploadBackend + ?Sized,
    F: FnMut(&UploadUpdate),
{
    let mut upload = ActiveUpload::start(backend, files).await;
    while let Some(updates) = upload.next_updates().await {
        for update in &updates {
            on_update(update);
        }
    }
    upload.progress().state()
}
