//! Streaming request plumbing shared by the chat and upload clients.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;

use super::traits::EVENT_CHANNEL_CAPACITY;
use crate::config::{ClientConfig, ConfigError};
use crate::decoder::decode_stream;
use crate::error::StreamError;
use crate::events::ClassifiedEvent;

/// Longest error body kept in [`StreamError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Build the HTTP client used by both streaming clients
pub(crate) fn build_http_client(
    request_timeout: Option<Duration>,
    connect_timeout: Duration,
) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ConfigError::ValidationError(format!("Failed to create HTTP client: {e}")))
}

/// Build the HTTP client from resolved configuration
pub(crate) fn http_client_from_config(config: &ClientConfig) -> Result<reqwest::Client, ConfigError> {
    build_http_client(config.request_timeout, config.connect_timeout)
}

/// A channel already holding one terminal error
pub(crate) fn failed_stream<T: Send>(error: StreamError) -> mpsc::Receiver<Result<T, StreamError>> {
    let (tx, rx) = mpsc::channel(1);
    // Capacity 1 and a fresh channel: try_send cannot fail here
    let _ = tx.try_send(Err(error));
    rx
}

/// Issue `request` on a spawned task and forward classified events
///
/// The task stops reading the body right after the first terminal event, or
/// as soon as the receiver is dropped.
pub(crate) fn spawn_event_stream<T>(
    request: reqwest::RequestBuilder,
    stream_name: &'static str,
) -> mpsc::Receiver<Result<T, StreamError>>
where
    T: ClassifiedEvent,
{
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let error = StreamError::from_reqwest(&e);
                tracing::warn!(stream = stream_name, error = %error, "Request failed");
                let _ = tx.send(Err(error)).await;
                return;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            let error = StreamError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            };
            tracing::warn!(stream = stream_name, error = %error, "Server rejected request");
            let _ = tx.send(Err(error)).await;
            return;
        }

        tracing::info!(stream = stream_name, status = %status, "Event stream opened");

        let events = decode_stream(response.bytes_stream());
        tokio::pin!(events);

        let mut forwarded = 0usize;
        while let Some(event) = events.next().await {
            let event = T::from(event);
            let terminal = event.is_terminal();
            let tag = event.tag().to_string();

            if tx.send(Ok(event)).await.is_err() {
                // Receiver dropped: the stream was cancelled
                tracing::debug!(stream = stream_name, forwarded, "Event stream cancelled");
                return;
            }
            forwarded += 1;

            if terminal {
                tracing::info!(stream = stream_name, forwarded, tag = %tag, "Event stream finished");
                return;
            }
        }

        tracing::info!(stream = stream_name, forwarded, "Event stream closed by server");
    });

    rx
}
