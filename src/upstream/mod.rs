//! Streaming chat completion calls to the upstream provider

mod sse;

use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::time::Duration;

use crate::api::{ChatCompletionRequest, ErrorBody, StreamChunk};
use crate::config::UpstreamConfig;
use crate::resolver::Route;

pub use sse::{SseDecoder, SseEvent};

/// Stream of text deltas produced by the provider, in arrival order
pub type DeltaStream = BoxStream<'static, Result<String, UpstreamError>>;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to reach upstream provider: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream provider returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("upstream provider error: {0}")]
    Provider(String),

    #[error("malformed upstream stream: {0}")]
    Malformed(String),
}

/// Build the `/chat/completions` URL below a provider base URL
pub fn chat_completions_url(base_url: &str) -> Result<url::Url, UpstreamError> {
    let invalid = |reason: String| UpstreamError::InvalidEndpoint {
        endpoint: base_url.to_string(),
        reason,
    };

    let mut url = url::Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    url.path_segments_mut()
        .map_err(|_| invalid("cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(["chat", "completions"]);
    Ok(url)
}

/// Pull a readable message out of a provider error body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => body.trim().to_string(),
    }
}

/// HTTP client for OpenAI-compatible providers
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Build a client with the configured connect timeout
    ///
    /// No total request timeout is set: the relay deadline bounds each stream.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { http })
    }

    /// Open a streaming chat completion on the routed provider
    ///
    /// Resolves once the provider has accepted the request. Non-success statuses
    /// are reported here, before any text is relayed; failures after that point
    /// arrive as an `Err` item on the returned stream.
    pub async fn stream_chat(
        &self,
        route: &Route,
        request: &ChatCompletionRequest,
    ) -> Result<DeltaStream, UpstreamError> {
        let url = chat_completions_url(&route.base_url)?;

        tracing::debug!(url = %url, model = %request.model, "Opening upstream stream");

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", route.api_key))
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error_body = %body, "Upstream returned error response");
            return Err(UpstreamError::Status {
                status,
                message: error_message(&body),
            });
        }

        Ok(delta_stream(response.bytes_stream().boxed()))
    }
}

struct DeltaState {
    bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, UpstreamError>>,
    finished: bool,
}

impl DeltaState {
    /// Turn decoded events into queued deltas; returns true once the stream is over
    fn absorb(&mut self, events: Vec<SseEvent>) -> bool {
        for event in events {
            match event {
                SseEvent::Done => return true,
                SseEvent::Data(data) => match serde_json::from_str::<StreamChunk>(&data) {
                    Ok(chunk) => {
                        if let Some(error) = chunk.error {
                            self.pending.push_back(Err(UpstreamError::Provider(error.message)));
                            return true;
                        }
                        if let Some(content) = chunk.content() {
                            self.pending.push_back(Ok(content.to_string()));
                        }
                    }
                    Err(e) => {
                        self.pending
                            .push_back(Err(UpstreamError::Malformed(format!("{}: {}", e, data))));
                        return true;
                    }
                },
            }
        }
        false
    }
}

/// Decode an SSE byte stream into text deltas
fn delta_stream(bytes: BoxStream<'static, reqwest::Result<bytes::Bytes>>) -> DeltaStream {
    let state = DeltaState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.finished = state.absorb(events);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Error reading upstream stream chunk");
                    state.finished = true;
                    state.pending.push_back(Err(UpstreamError::Network(e)));
                }
                None => {
                    let events = state.decoder.finish();
                    state.absorb(events);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
