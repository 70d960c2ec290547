//! Ragchat Core - Streaming Chat and Upload Client
//!
//! This crate holds everything a ragchat front-end needs apart from drawing:
//! the SSE-style line decoder, the chat and upload streaming clients, the
//! rules that turn stream events into display updates, and the conversation
//! history those updates are committed to. The CLI and the TUI are thin
//! surfaces over it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surfaces                             │
//! │        ┌──────────────┐            ┌──────────────┐          │
//! │        │  ragchat     │            │ ragchat-tui  │          │
//! │        │  (clap CLI)  │            │  (ratatui)   │          │
//! │        └──────┬───────┘            └──────┬───────┘          │
//! │               └─────────────┬─────────────┘                  │
//! │                  ChatUpdate / UploadUpdate                   │
//! └─────────────────────────────┼────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┼────────────────────────────────┐
//! │                       RAGCHAT CORE                           │
//! │  ┌──────────────┐  ┌────────┴───────┐  ┌──────────────────┐  │
//! │  │ Conversation │◄─┤  Reconcilers   │◄─┤ ChatStreamClient │  │
//! │  │    Store     │  │  (+ Session)   │  │ UploadStream...  │  │
//! │  └──────────────┘  └────────────────┘  └────────┬─────────┘  │
//! │                                                 │            │
//! │                                        decoder (data: lines) │
//! └─────────────────────────────────────────────────┼────────────┘
//!                                                   │ HTTP
//!                                       /api/v1/ask, /api/v1/upload
//! ```
//!
//! # Key Types
//!
//! - [`ChatStreamClient`] / [`UploadStreamClient`]: streaming HTTP clients
//! - [`ChatReconciler`] / [`UploadReconciler`]: event to display rules
//! - [`ActiveChat`] / [`ActiveUpload`]: a receiver paired with its reconciler
//! - [`ConversationStore`]: committed turns
//! - [`ClientConfig`]: secrets, endpoints and prompt settings
//!
//! # Quick Start
//!
//! ```ignore
//! use ragchat_core::{load_config, run_chat, ChatStreamClient, ConfigOverrides, ConversationStore};
//!
//! let config = load_config(&ConfigOverrides::default())?;
//! let client = ChatStreamClient::from_config(&config)?;
//! let mut store = ConversationStore::new();
//!
//! run_chat(&client, &mut store, "Xin chào", |update| println!("{update:?}")).await;
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: chat and upload clients behind async traits
//! - [`config`]: layered configuration (file, environment, flags)
//! - [`decoder`]: `data: ` line decoding over a byte stream
//! - [`driver`]: receivers paired with reconcilers
//! - [`error`]: transport and store errors
//! - [`events`]: wire events and their classification
//! - [`messages`]: chat messages and sources
//! - [`prompt`]: the instruction template wrapped around questions
//! - [`reconcile`]: display rules for both streams
//! - [`session`]: the in-flight chat turn
//! - [`store`]: conversation history

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod events;
pub mod messages;
pub mod prompt;
pub mod reconcile;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use backend::{
    ChatBackend, ChatItem, ChatReceiver, ChatStreamClient, UploadBackend, UploadFile, UploadItem,
    UploadReceiver, UploadStreamClient,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ConfigError,
    ConfigOverrides, ConfigSource,
};
pub use decoder::{decode_line, decode_stream};
pub use driver::{run_chat, run_upload, ActiveChat, ActiveUpload};
pub use error::{StoreError, StreamError};
pub use events::{ChatEvent, ClassifiedEvent, Event, UploadEvent};
pub use messages::{ChatMessage, MessageRole, Source};
pub use prompt::{render_prompt, PromptTemplate};
pub use reconcile::{
    prepare_query, ChatReconciler, ChatUpdate, UploadReconciler, UploadState, UploadUpdate, CURSOR,
    UPLOAD_STARTING_LABEL,
};
pub use session::{StreamSession, ERROR_STATUS, SERVER_ERROR_REPLY};
pub use store::{ConversationStore, Turn};
