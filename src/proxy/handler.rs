//! Request handlers for the proofreading endpoints

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use std::time::Duration;

use super::server::ProxyState;
use super::streaming::relay_response;
use crate::api::{ChatCompletionRequest, CompletionRequest, ModelsResponse, PromptCatalog, SystemPromptQuery};
use crate::error::ProxyError;
use crate::prompt;
use crate::stats::{format_request_log, CompletionMetrics};

/// Completion request handler
pub struct CompletionHandler {
    state: ProxyState,
}

impl CompletionHandler {
    pub fn new(state: ProxyState) -> Self {
        Self { state }
    }

    /// Decode and validate the body before anything else is touched
    fn parse(body: &[u8]) -> Result<CompletionRequest, ProxyError> {
        let request: CompletionRequest =
            serde_json::from_slice(body).map_err(|e| ProxyError::Validation(e.to_string()))?;
        request.validate().map_err(ProxyError::Validation)?;
        Ok(request)
    }

    /// Handle a `POST /completion` body
    ///
    /// Validation, routing and prompt composition all happen before the
    /// upstream provider is contacted, so rejected requests never leave the proxy.
    pub async fn handle(&self, body: Bytes) -> Result<Response, ProxyError> {
        let request = Self::parse(&body)?;

        tracing::info!("{}", format_request_log(&request));

        let route = self
            .state
            .resolver
            .resolve(&request.api_key, &request.model, &request.endpoint)?;
        let system = prompt::compose(&request.context, &request.instruction)?;

        tracing::debug!(
            base_url = %route.base_url,
            provisioned = route.is_provisioned(),
            "Resolved upstream route"
        );

        let chat = ChatCompletionRequest::streaming(&request.model, system, &request.prompt);
        let deltas = self.state.upstream.stream_chat(&route, &chat).await?;

        let metrics = CompletionMetrics::new(
            &request.model,
            &request.context,
            &request.instruction,
            route.user.clone(),
            request.prompt.chars().count(),
        );

        Ok(relay_response(
            deltas,
            metrics,
            Duration::from_secs(self.state.config.upstream.stream_timeout_seconds),
            self.state.config.stats.clone(),
        ))
    }
}

/// `POST /completion`
pub async fn completion_handler(State(state): State<ProxyState>, body: Bytes) -> Response {
    let handler = CompletionHandler::new(state);
    match handler.handle(body).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// `GET /models`
pub async fn models_handler(State(state): State<ProxyState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.resolver.table().models().to_vec(),
    })
}

/// `GET /prompts`
pub async fn prompts_handler() -> Json<PromptCatalog> {
    Json(PromptCatalog::builtin())
}

/// `GET /system-prompt?context=..&instruction=..`
pub async fn system_prompt_handler(Query(query): Query<SystemPromptQuery>) -> Result<String, ProxyError> {
    Ok(prompt::compose(&query.context, &query.instruction)?)
}

/// Health check endpoint
pub async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = CompletionHandler::parse(b"{not json").unwrap_err();
        assert!(matches!(err, ProxyError::Validation(_)));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = CompletionHandler::parse(br#"{"model":"gpt-4"}"#).unwrap_err();
        assert!(err.to_string().starts_with("validation failed"));
    }

    #[test]
    fn test_parse_rejects_blank_prompt() {
        let err = CompletionHandler::parse(
            br#"{"model":"gpt-4","context":"general","instruction":"basicProofread","prompt":"   "}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[test]
    fn test_parse_accepts_minimal_request() {
        let request = CompletionHandler::parse(
            br#"{"model":"gpt-4","context":"general","instruction":"basicProofread","prompt":"hi"}"#,
        )
        .unwrap();
        assert_eq!(request.model, "gpt-4");
        assert!(request.api_key.is_empty());
    }

    #[tokio::test]
    async fn test_system_prompt_handler_unknown_key() {
        let result = system_prompt_handler(Query(SystemPromptQuery {
            context: "nope".to_string(),
            instruction: "basicProofread".to_string(),
        }))
        .await;
        assert!(matches!(result, Err(ProxyError::InvalidKey(_))));
    }
}
