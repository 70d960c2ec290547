//! Upload Stream Client
//!
//! Sends a batch of documents to the ingestion endpoint and streams its
//! progress events.
//!
//! # API
//!
//! `POST {base_url}/api/v1/upload`, multipart body with one `files` part per
//! document (file name, bytes, MIME type) and `Accept: text/event-stream`.
//! No credential is sent.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};

use super::stream::{failed_stream, http_client_from_config, spawn_event_stream};
use super::traits::{UploadBackend, UploadFile, UploadReceiver};
use crate::config::{ClientConfig, ConfigError};
use crate::error::StreamError;

/// Multipart field name for every uploaded document
pub const UPLOAD_FIELD: &str = "files";

/// MIME type used when none can be determined
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Streaming client for the ingestion endpoint
#[derive(Clone)]
pub struct UploadStreamClient {
    /// Base URL without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl UploadStreamClient {
    /// Create a client from its parts
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Create a client from resolved configuration
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.upload_base_url.clone(),
            http_client_from_config(config)?,
        ))
    }

    /// Get the upload endpoint URL
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!("{}/api/v1/upload", self.base_url)
    }
}

/// Build the multipart form, one `files` part per document
///
/// An unparsable MIME type is replaced with [`FALLBACK_MIME`].
pub fn build_form(files: Vec<UploadFile>) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();
    for file in files {
        let mime = if file.mime_type.parse::<mime_guess::mime::Mime>().is_ok() {
            file.mime_type
        } else {
            FALLBACK_MIME.to_string()
        };
        let part = Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&mime)?;
        form = form.part(UPLOAD_FIELD, part);
    }
    Ok(form)
}

#[async_trait]
impl UploadBackend for UploadStreamClient {
    fn name(&self) -> &str {
        "Ingestion"
    }

    async fn upload_files(&self, files: Vec<UploadFile>) -> UploadReceiver {
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        tracing::info!(url = %self.upload_url(), files = ?names, "Uploading files");

        let form = match build_form(files) {
            Ok(form) => form,
            Err(e) => return failed_stream(StreamError::Request(e.to_string())),
        };

        let request = self
            .http_client
            .post(self.upload_url())
            .header(ACCEPT, "text/event-stream")
            .multipart(form);

        spawn_event_stream(request, "upload")
    }
}

/// Guess a MIME type from a file name
#[must_use]
pub fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map_or_else(|| FALLBACK_MIME.to_string(), |m| m.essence_str().to_string())
}

/// Read a file from disk into an [`UploadFile`]
///
/// # Errors
///
/// Fails when the file cannot be read or has no file name.
pub async fn load_file(path: &Path) -> anyhow::Result<UploadFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = guess_mime(&name);
    Ok(UploadFile::new(name, bytes, mime_type))
}

/// Read several files, preserving order
///
/// # Errors
///
/// Fails on the first file that cannot be read.
pub async fn load_files<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_file(path.as_ref()).await?);
    }
    Ok(files)
}
