//! Authorization and upstream routing for completion requests

use std::fmt;
use std::sync::Arc;

use crate::credentials::CredentialTable;

/// Upstream endpoint and secret selected for one request
#[derive(Clone, PartialEq, Eq)]
pub struct Route {
    pub base_url: String,
    pub api_key: String,
    /// Name of the provisioned caller, `None` for self-provisioned callers
    pub user: Option<String>,
}

impl Route {
    pub fn is_provisioned(&self) -> bool {
        self.user.is_some()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("model not allowed: '{0}' is not available with this key, please provide your own API key when using a custom model")]
    ModelNotAllowed(String),

    #[error("invalid credential: no usable API key or endpoint")]
    InvalidCredential,
}

/// Decides which upstream provider and secret serve a request
///
/// Holds the read-only credential table for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<CredentialTable>,
    default_base_url: String,
}

impl Resolver {
    pub fn new(table: Arc<CredentialTable>, default_base_url: impl Into<String>) -> Self {
        Self {
            table,
            default_base_url: default_base_url.into(),
        }
    }

    pub fn table(&self) -> &CredentialTable {
        &self.table
    }

    /// Resolve the route for a caller-supplied key, model and endpoint override
    ///
    /// A key belonging to a provisioned caller selects that caller's upstream and
    /// restricts the model to the allow-list; the endpoint override is ignored.
    /// Any other key is forwarded as-is to the caller's endpoint (or the default
    /// provider) with no model restriction.
    pub fn resolve(&self, api_key: &str, model: &str, endpoint: &str) -> Result<Route, ResolveError> {
        let route = match self.table.find_by_key(api_key) {
            Some(user) => {
                tracing::info!(user = %user.name, model = %model, "Provisioned user is using model");

                if !self.table.is_model_allowed(model) {
                    return Err(ResolveError::ModelNotAllowed(model.to_string()));
                }

                Route {
                    base_url: user.base_url.clone(),
                    api_key: user.api_key.clone(),
                    user: Some(user.name.clone()),
                }
            }
            None => Route {
                base_url: if endpoint.is_empty() {
                    self.default_base_url.clone()
                } else {
                    endpoint.to_string()
                },
                api_key: api_key.to_string(),
                user: None,
            },
        };

        if route.base_url.is_empty() || route.api_key.is_empty() {
            return Err(ResolveError::InvalidCredential);
        }

        Ok(route)
    }
}
