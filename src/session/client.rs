//! HTTP client for a running proofreader server

use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

use super::SessionError;
use crate::api::{CompletionRequest, ModelsResponse};

/// Raw body chunks of a completion response
pub type ByteStream = BoxStream<'static, reqwest::Result<bytes::Bytes>>;

#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl CompletionClient {
    /// Client for the server at `server`, e.g. `http://127.0.0.1:3000` or `https://host/api`
    pub fn new(server: &str) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Self::with_client(http, server)
    }

    pub fn with_client(http: reqwest::Client, server: &str) -> Result<Self, SessionError> {
        let base_url = url::Url::parse(server.trim()).map_err(|e| SessionError::InvalidServer {
            server: server.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SessionError::InvalidServer {
                server: server.to_string(),
                reason: "cannot be a base URL".to_string(),
            });
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> url::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(name);
        }
        url
    }

    /// Post a completion request and return the streamed body
    ///
    /// A non-success status is turned into an error carrying the response body
    /// text, which is how the server explains rejections.
    pub async fn completion(&self, request: &CompletionRequest) -> Result<ByteStream, SessionError> {
        let url = self.endpoint("completion");
        tracing::debug!(url = %url, model = %request.model, "Requesting completion");

        let response = self.http.post(url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match body.trim() {
                "" => status.to_string(),
                text => text.to_string(),
            };
            return Err(SessionError::Status { status, message });
        }

        Ok(response.bytes_stream().boxed())
    }

    /// Fetch the server's model allow-list
    pub async fn models(&self) -> Result<Vec<String>, SessionError> {
        let response = self.http.get(self.endpoint("models")).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default().trim().to_string();
            return Err(SessionError::Status { status, message });
        }

        let body: ModelsResponse = response.json().await?;
        Ok(body.models)
    }
}
