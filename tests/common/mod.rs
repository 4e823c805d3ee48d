//! Mock upstream provider and helpers shared by the integration tests
//!
//! Tests queue responses on the provider before each request and inspect the
//! requests it received afterwards.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::Response,
    routing::post,
    Router,
};
use futures::StreamExt;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use proofreader::{build_router, config::AppConfig, CredentialTable, ProxyState};

pub const PROVISIONED_KEY: &str = "provisioned-key";
pub const SERVER_SECRET: &str = "server-secret";

/// A response the provider serves for the next chat completion request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub chunks: Vec<String>,
    /// Keep the body open after the last chunk instead of ending it
    pub hold_open: bool,
}

impl MockResponse {
    /// A complete SSE stream carrying `deltas`, ending with `[DONE]`
    pub fn sse(deltas: &[&str]) -> Self {
        let mut chunks: Vec<String> = deltas.iter().map(|d| sse_chunk(d)).collect();
        chunks.push("data: [DONE]\n\n".to_string());
        Self {
            status: 200,
            content_type: "text/event-stream".to_string(),
            chunks,
            hold_open: false,
        }
    }

    /// An SSE stream that delivers `deltas` and then stalls
    pub fn sse_stalled(deltas: &[&str]) -> Self {
        Self {
            chunks: deltas.iter().map(|d| sse_chunk(d)).collect(),
            hold_open: true,
            ..Self::sse(&[])
        }
    }

    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            chunks: vec![body.into()],
            hold_open: false,
        }
    }
}

fn sse_chunk(delta: &str) -> String {
    let chunk = serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "model": "test-model",
        "choices": [{"index": 0, "delta": {"content": delta}, "finish_reason": null}],
    });
    format!("data: {}\n\n", chunk)
}

/// A request received by the mock provider
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct ProviderState {
    pub response_queue: VecDeque<MockResponse>,
    pub received_requests: Vec<ReceivedRequest>,
}

pub type SharedProviderState = Arc<Mutex<ProviderState>>;

async fn handle_chat_completions(
    State(state): State<SharedProviderState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received = ReceivedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };

    let mock = {
        let mut state = state.lock().unwrap();
        state.received_requests.push(received);
        state
            .response_queue
            .pop_front()
            .unwrap_or_else(|| MockResponse::sse(&["Default response (no mock queued)"]))
    };

    let chunks = futures::stream::iter(
        mock.chunks
            .into_iter()
            .map(|c| Ok::<_, std::io::Error>(Bytes::from(c))),
    );
    let body = if mock.hold_open {
        Body::from_stream(chunks.chain(futures::stream::pending()))
    } else {
        Body::from_stream(chunks)
    };

    Response::builder()
        .status(StatusCode::from_u16(mock.status).unwrap())
        .header("content-type", mock.content_type)
        .body(body)
        .unwrap()
}

/// An OpenAI-compatible provider listening on an ephemeral port
pub struct MockProvider {
    pub addr: SocketAddr,
    pub state: SharedProviderState,
}

impl MockProvider {
    pub async fn start() -> Self {
        let state = SharedProviderState::default();
        let app = Router::new()
            .route("/*path", post(handle_chat_completions))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL ending in `/v1`, as configured for provisioned users
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn push(&self, response: MockResponse) {
        self.state.lock().unwrap().response_queue.push_back(response);
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.lock().unwrap().received_requests.clone()
    }
}

/// Credential table with one provisioned user routed to `base_url`
pub fn credentials(base_url: &str) -> CredentialTable {
    let document = format!(
        r#"
models = ["gpt-4", "gpt-4o-mini"]

[[users]]
name = "alice"
key = "{PROVISIONED_KEY}"
openai_base_url = "{base_url}"
openai_api_key = "{SERVER_SECRET}"
"#
    );
    CredentialTable::from_toml(&document).unwrap()
}

/// Proxy state whose provisioned user and default route both point at `provider`
pub fn proxy_state(provider: &MockProvider) -> ProxyState {
    proxy_state_with_timeout(provider, 30)
}

pub fn proxy_state_with_timeout(provider: &MockProvider, stream_timeout_seconds: u64) -> ProxyState {
    let mut config = AppConfig::default();
    config.upstream.default_base_url = provider.base_url();
    config.upstream.stream_timeout_seconds = stream_timeout_seconds;
    ProxyState::new(config, credentials(&provider.base_url())).unwrap()
}

/// Serve the proxy on an ephemeral port and return its base URL
pub async fn start_proxy(state: ProxyState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
