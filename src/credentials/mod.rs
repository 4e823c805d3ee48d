//! Provisioned credentials and the model allow-list
//!
//! The table is decoded once at startup from a TOML document and is never
//! mutated afterwards. A missing or malformed document yields an empty table,
//! which routes every caller through the self-provisioned path.

mod source;

use serde::Deserialize;
use std::fmt;

pub use source::{default_sources, Base64Source, DocumentSource, FileSource, SourceOutcome};

/// One pre-provisioned caller and the upstream endpoint/secret used on their behalf
#[derive(Clone, Deserialize)]
pub struct ProviderCredential {
    pub name: String,
    pub key: String,
    #[serde(rename = "openai_base_url")]
    pub base_url: String,
    #[serde(rename = "openai_api_key")]
    pub api_key: String,
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Decoded credential document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialTable {
    #[serde(default)]
    users: Vec<ProviderCredential>,
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Failed to parse credential document: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CredentialTable {
    pub fn new(users: Vec<ProviderCredential>, models: Vec<String>) -> Self {
        let users = users
            .into_iter()
            .filter(|user| {
                if user.key.is_empty() {
                    tracing::warn!(user = %user.name, "Skipping credential entry with an empty key");
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { users, models }
    }

    /// Parse a TOML credential document
    pub fn from_toml(content: &str) -> Result<Self, CredentialError> {
        let raw: CredentialTable = toml::from_str(content)?;
        Ok(Self::new(raw.users, raw.models))
    }

    /// Decode the table from a raw configuration value
    ///
    /// Each source is tried in order until one loads a document. If all of them
    /// decline, or the loaded document does not parse, the empty table is
    /// returned and every caller becomes self-provisioned.
    pub fn load(input: &str, sources: &[Box<dyn DocumentSource>]) -> Self {
        if input.trim().is_empty() {
            tracing::warn!("Credential configuration is empty, all callers must supply their own API key");
            return Self::default();
        }

        for source in sources {
            match source.load(input) {
                SourceOutcome::Loaded(content) => {
                    tracing::info!(source = source.name(), "Loaded credential document");
                    return match Self::from_toml(&content) {
                        Ok(table) => {
                            tracing::info!(
                                users = table.users.len(),
                                models = table.models.len(),
                                "Credential table ready"
                            );
                            table
                        }
                        Err(e) => {
                            tracing::error!(error = %e, source = source.name(), "Falling back to an empty credential table");
                            Self::default()
                        }
                    };
                }
                SourceOutcome::Declined(reason) => {
                    tracing::debug!(source = source.name(), reason = %reason, "Credential source declined");
                }
            }
        }

        tracing::error!("No credential source could decode the configuration, falling back to an empty table");
        Self::default()
    }

    /// Decode with the default source order: file path, then base64
    pub fn load_default(input: &str) -> Self {
        Self::load(input, &default_sources())
    }

    /// Find the provisioned caller owning `key`; an empty key never matches
    pub fn find_by_key(&self, key: &str) -> Option<&ProviderCredential> {
        if key.is_empty() {
            return None;
        }
        self.users.iter().find(|user| user.key == key)
    }

    pub fn is_model_allowed(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn users(&self) -> &[ProviderCredential] {
        &self.users
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.models.is_empty()
    }
}
