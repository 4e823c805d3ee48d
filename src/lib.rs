//! proofreader: streaming proofreading proxy for OpenAI-compatible providers
//!
//! Features:
//! - Per-request routing between server-held credentials and caller keys
//! - Model allow-list for provisioned callers
//! - System prompts composed from writing contexts and instructions
//! - Plain-text streaming of the corrected text
//! - Client session with cancellation for front ends

pub mod api;
pub mod config;
pub mod credentials;
pub mod error;
pub mod prompt;
pub mod proxy;
pub mod resolver;
pub mod session;
pub mod stats;
pub mod upstream;

pub use config::AppConfig;
pub use credentials::CredentialTable;
pub use error::ProxyError;
pub use proxy::{build_router, run_server, ProxyState};
pub use resolver::{Resolver, Route};
pub use session::{CompletionClient, ProofreadSettings, StreamingSession, TextSink};
