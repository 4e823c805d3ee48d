//! Errors surfaced by the proxy endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::prompt::PromptError;
use crate::resolver::ResolveError;
use crate::upstream::UpstreamError;

/// Every way a completion request can fail before its stream starts
///
/// Each variant maps to a fixed status code and a plain-text body; none of them
/// is retried by the proxy.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    InvalidKey(#[from] PromptError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Resolve(ResolveError::ModelNotAllowed(_)) => StatusCode::BAD_REQUEST,
            ProxyError::Resolve(ResolveError::InvalidCredential) => StatusCode::FORBIDDEN,
            ProxyError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(UpstreamError::InvalidEndpoint { .. }) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Completion request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Completion request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::from(ResolveError::ModelNotAllowed("m".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::from(ResolveError::InvalidCredential).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ProxyError::from(PromptError::InvalidContext("c".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::from(UpstreamError::Provider("boom".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_messages_are_passed_through() {
        let err = ProxyError::from(ResolveError::InvalidCredential);
        assert!(err.to_string().starts_with("invalid credential"));

        let err = ProxyError::from(PromptError::InvalidInstruction("zzz".into()));
        assert_eq!(err.to_string(), "invalid instruction key: zzz");
    }

    #[test]
    fn test_into_response_status() {
        let response = ProxyError::from(ResolveError::InvalidCredential).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
