//! Chat Stream Client
//!
//! Sends a question to the inference endpoint and streams the answer events.
//!
//! # API
//!
//! `POST {base_url}/api/v1/ask` with a JSON body `{"question": <prompt>}`,
//! `Accept: text/event-stream` and a bearer credential. The response body is
//! a sequence of `data: {"type": ..., "data": ...}` lines.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};

use super::stream::{http_client_from_config, spawn_event_stream};
use super::traits::{ChatBackend, ChatReceiver};
use crate::config::{ClientConfig, ConfigError};
use crate::prompt::PromptTemplate;

/// Streaming client for the question-answering endpoint
#[derive(Clone)]
pub struct ChatStreamClient {
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer credential
    api_key: String,
    /// Prompt template wrapped around every question
    prompt: PromptTemplate,
    /// HTTP client
    http_client: reqwest::Client,
}

impl ChatStreamClient {
    /// Create a client from its parts
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        prompt: PromptTemplate,
        http_client: reqwest::Client,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            prompt,
            http_client,
        }
    }

    /// Create a client from resolved configuration
    ///
    /// # Errors
    ///
    /// Fails when a required secret is missing or the HTTP client cannot be
    /// built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.chat_base_url()?,
            config.api_key()?,
            config.prompt.clone(),
            http_client_from_config(config)?,
        ))
    }

    /// Get the ask endpoint URL
    #[must_use]
    pub fn ask_url(&self) -> String {
        format!("{}/api/v1/ask", self.base_url)
    }

    /// Build the JSON request body for a question
    #[must_use]
    pub fn request_body(&self, query: &str) -> serde_json::Value {
        serde_json::json!({
            "question": self.prompt.render(query),
        })
    }
}

#[async_trait]
impl ChatBackend for ChatStreamClient {
    fn name(&self) -> &str {
        "RunPod"
    }

    async fn send_query(&self, query: &str) -> ChatReceiver {
        tracing::info!(url = %self.ask_url(), query_len = query.len(), "Sending chat query");

        let request = self
            .http_client
            .post(self.ask_url())
            .header(ACCEPT, "text/event-stream")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&self.request_body(query));

        spawn_event_stream(request, "chat")
    }
}
