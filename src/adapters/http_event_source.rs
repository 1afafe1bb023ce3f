//! Event source over HTTP with an SSE response body.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::events::RunEvent;
use crate::models::StreamRequest;
use crate::sse::SseParser;
use crate::traits::{EventSource, EventStream};

use super::error::HttpAdapterError;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Streams runs from `POST {base_url}/v1/stream`.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    pub base_url: String,
    client: Client,
    auth_token: Option<String>,
    idle_timeout: Duration,
}

impl HttpEventSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, client)
    }

    /// Use a preconfigured reqwest client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            auth_token: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Longest gap allowed between two chunks before the stream is abandoned
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn stream_url(&self) -> String {
        format!("{}/v1/stream", self.base_url)
    }

    async fn send(&self, request: &StreamRequest) -> Result<reqwest::Response, HttpAdapterError> {
        let mut builder = self
            .client
            .post(self.stream_url())
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(HttpAdapterError::Status { status, message });
        }
        Ok(response)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancellationToken,
    ) -> Result<EventStream, TransportError> {
        let url = self.stream_url();
        let timeout_secs = self.idle_timeout.as_secs();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(TransportError::Interrupted {
                    message: "cancelled before the stream opened".to_string(),
                });
            }
            response = self.send(request) => {
                response.map_err(|e| e.into_transport(&url, timeout_secs))?
            }
        };

        tracing::debug!(run_id = %request.run_id, %url, "event stream opened");
        let events = sse_events(response.bytes_stream(), cancel, self.idle_timeout)
            .map(move |item| item.map_err(|e| e.into_transport(&url, timeout_secs)));
        Ok(Box::pin(events))
    }
}

struct StreamState<S> {
    bytes: S,
    parser: SseParser,
    buffer: Vec<u8>,
    cancel: CancellationToken,
    idle_timeout: Duration,
    finished: bool,
}

impl<S> StreamState<S> {
    /// Feed every complete line in the buffer until one yields an event
    fn drain_lines(&mut self) -> Option<Result<RunEvent, HttpAdapterError>> {
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            match self.parser.feed_line(&line) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    /// Flush whatever is left once the body ends
    fn drain_tail(&mut self) -> Option<Result<RunEvent, HttpAdapterError>> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&self.buffer).into_owned();
            self.buffer.clear();
            match self.parser.feed_line(&line) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
        if self.parser.has_pending() {
            return self
                .parser
                .feed_line("")
                .map_err(HttpAdapterError::from)
                .transpose();
        }
        None
    }
}

/// Turn a response body into run events.
///
/// The stream ends quietly when `cancel` fires; it yields a timeout error if
/// no chunk arrives within `idle_timeout`.
pub fn sse_events<S, E>(
    bytes: S,
    cancel: CancellationToken,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<RunEvent, HttpAdapterError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<HttpAdapterError> + Send + 'static,
{
    let state = StreamState {
        bytes,
        parser: SseParser::new(),
        buffer: Vec::new(),
        cancel,
        idle_timeout,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.finished {
                return None;
            }
            if let Some(item) = state.drain_lines() {
                return Some((item, state));
            }

            let next = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => {
                    tracing::debug!("event stream cancelled");
                    return None;
                }
                next = tokio::time::timeout(state.idle_timeout, state.bytes.next()) => next,
            };

            match next {
                Ok(Some(Ok(chunk))) => state.buffer.extend_from_slice(&chunk),
                Ok(Some(Err(e))) => {
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                Ok(None) => {
                    state.finished = true;
                    return state.drain_tail().map(|item| (item, state));
                }
                Err(_) => {
                    state.finished = true;
                    let err = HttpAdapterError::Idle(state.idle_timeout.as_secs());
                    return Some((Err(err), state));
                }
            }
        }
    })
}
