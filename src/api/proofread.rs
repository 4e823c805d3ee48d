//! Request and response bodies of the proofreading endpoints

use serde::{Deserialize, Serialize};

use crate::prompt::{Context, Instruction, CONTEXTS, INSTRUCTIONS};

/// Body of `POST /completion`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model: String,
    pub context: String,
    pub instruction: String,
    /// The text to proofread
    pub prompt: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
}

impl CompletionRequest {
    /// Reject requests that cannot be routed before any credential is looked at
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        if self.context.is_empty() {
            return Err("context must not be empty".to_string());
        }
        if self.instruction.is_empty() {
            return Err("instruction must not be empty".to_string());
        }
        Ok(())
    }
}

/// Body of `GET /models`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// Body of `GET /prompts`
#[derive(Debug, Clone, Serialize)]
pub struct PromptCatalog {
    pub contexts: &'static [Context],
    pub instructions: &'static [Instruction],
}

impl PromptCatalog {
    pub fn builtin() -> Self {
        Self {
            contexts: CONTEXTS,
            instructions: INSTRUCTIONS,
        }
    }
}

/// Query of `GET /system-prompt`
#[derive(Debug, Clone, Deserialize)]
pub struct SystemPromptQuery {
    pub context: String,
    pub instruction: String,
}
