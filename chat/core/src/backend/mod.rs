//! Remote Backends
//!
//! Streaming clients for the two remote services ragchat talks to.
//!
//! # Available Backends
//!
//! - **Chat** ([`ChatStreamClient`]): question answering over RunPod
//! - **Upload** ([`UploadStreamClient`]): document ingestion
//!
//! # Usage
//!
//! ```ignore
//! use ragchat_core::backend::{ChatBackend, ChatStreamClient};
//!
//! let client = ChatStreamClient::from_config(&config)?;
//! let mut rx = client.send_query("Hello!").await;
//! while let Some(item) = rx.recv().await {
//!     println!("{item:?}");
//! }
//! ```

mod chat;
mod stream;
mod traits;
mod upload;

pub use chat::ChatStreamClient;
pub use traits::{
    ChatBackend, ChatItem, ChatReceiver, UploadBackend, UploadFile, UploadItem, UploadReceiver,
    EVENT_CHANNEL_CAPACITY,
};
pub use upload::{
    build_form, guess_mime, load_file, load_files, UploadStreamClient, FALLBACK_MIME, UPLOAD_FIELD,
};
