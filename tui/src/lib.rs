//! Ragchat TUI - Terminal interface for ragchat
//!
//! A full-screen client with two tabs: Chat streams answers into the
//! conversation view, Upload sends documents to the ingestion service and
//! shows their progress.
//!
//! # Architecture
//!
//! - **App**: event loop, stream lifecycle, layout
//! - **Display**: pure display state derived from stream updates
//! - **Theme**: colors per display line kind

pub mod app;
pub mod display;
pub mod theme;

pub use app::{App, Tab};
