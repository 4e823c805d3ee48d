//! Proxy server setup

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler::{
    completion_handler, health_handler, models_handler, prompts_handler, system_prompt_handler,
};
use crate::config::AppConfig;
use crate::credentials::CredentialTable;
use crate::resolver::Resolver;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Shared state for the proxy
///
/// Everything in here is read-only once the server is running.
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AppConfig>,
    pub resolver: Arc<Resolver>,
    pub upstream: UpstreamClient,
}

impl ProxyState {
    pub fn new(config: AppConfig, table: CredentialTable) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        Ok(Self::with_upstream(config, table, upstream))
    }

    pub fn with_upstream(config: AppConfig, table: CredentialTable, upstream: UpstreamClient) -> Self {
        let resolver = Resolver::new(Arc::new(table), config.upstream.default_base_url.clone());
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            upstream,
        }
    }
}

/// Build the router
///
/// Endpoints are served both at the root and below `/api`, where the browser
/// front end expects them.
pub fn build_router(state: ProxyState) -> Router {
    let routes = Router::new()
        .route("/completion", post(completion_handler))
        .route("/models", get(models_handler))
        .route("/prompts", get(prompts_handler))
        .route("/system-prompt", get(system_prompt_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)),
        )
        .with_state(state)
}

/// Run the proxy server
pub async fn run_server(config: AppConfig, table: CredentialTable) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let default_base_url = config.upstream.default_base_url.clone();
    let provisioned_users = table.users().len();
    let allowed_models = table.models().len();

    let state = ProxyState::new(config, table)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("proofreader listening on {}", addr);
    tracing::info!(
        provisioned_users,
        allowed_models,
        default_upstream = %default_base_url,
        "Routing configured"
    );

    Ok(axum::serve(listener, app).await?)
}
