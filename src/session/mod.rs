//! Client side of a proofreading request
//!
//! A [`StreamingSession`] posts one request at a time to the server, feeds the
//! growing text to a [`TextSink`] and can be cancelled at any point. Starting a
//! new request supersedes the one in flight.

mod client;
mod sink;
mod utf8;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::CompletionRequest;
use crate::prompt::{self, PromptError, DEFAULT_CONTEXT, DEFAULT_INSTRUCTION};

pub use client::{ByteStream, CompletionClient};
pub use sink::{TextBuffer, TextSink};
pub use utf8::{InvalidUtf8, Utf8Decoder};

pub const VALIDATION_MESSAGE: &str = "Please select a model and enter text to proofread";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{}", VALIDATION_MESSAGE)]
    Validation,

    #[error("invalid server URL '{server}': {reason}")]
    InvalidServer { server: String, reason: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with an error status; `message` is its body text
    #[error("{message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error(transparent)]
    Decode(#[from] InvalidUtf8),
}

/// What the user picked in the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProofreadSettings {
    pub model: Option<String>,
    pub context: String,
    pub instruction: String,
    pub endpoint: String,
    pub api_key: String,
}

impl Default for ProofreadSettings {
    fn default() -> Self {
        Self {
            model: None,
            context: DEFAULT_CONTEXT.to_string(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
            endpoint: String::new(),
            api_key: String::new(),
        }
    }
}

impl ProofreadSettings {
    /// Replace context or instruction keys that no longer exist with the defaults
    ///
    /// Settings outlive releases, so a stored key may have been renamed since.
    pub fn normalized(mut self) -> Self {
        if prompt::find_context(&self.context).is_none() {
            tracing::debug!(context = %self.context, "Unknown context, using default");
            self.context = DEFAULT_CONTEXT.to_string();
        }
        if prompt::find_instruction(&self.instruction).is_none() {
            tracing::debug!(instruction = %self.instruction, "Unknown instruction, using default");
            self.instruction = DEFAULT_INSTRUCTION.to_string();
        }
        self
    }

    /// Fail on context or instruction keys the server would reject
    ///
    /// For keys the user typed in; stored settings go through `normalized` instead.
    pub fn check_keys(&self) -> Result<(), PromptError> {
        if prompt::find_context(&self.context).is_none() {
            return Err(PromptError::InvalidContext(self.context.clone()));
        }
        if prompt::find_instruction(&self.instruction).is_none() {
            return Err(PromptError::InvalidInstruction(self.instruction.clone()));
        }
        Ok(())
    }

    /// Build the request body for `text`, or fail if there is nothing to send
    pub fn request(&self, text: &str) -> Result<CompletionRequest, SessionError> {
        let model = match self.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => model,
            _ => return Err(SessionError::Validation),
        };
        if text.trim().is_empty() {
            return Err(SessionError::Validation);
        }

        Ok(CompletionRequest {
            model: model.to_string(),
            context: self.context.clone(),
            instruction: self.instruction.clone(),
            prompt: text.to_string(),
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Streaming,
    Errored,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub text: String,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Bumped by every start and cancel; a task only writes while it still owns the current value
    generation: u64,
    snapshot: SessionSnapshot,
}

/// State shared between the session handle and its streaming task
struct Shared {
    state: Mutex<SessionState>,
    status: watch::Sender<SessionStatus>,
    sink: Arc<dyn TextSink>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_status(&self, state: &mut SessionState, status: SessionStatus) {
        state.snapshot.status = status;
        self.status.send_replace(status);
    }
}

/// One proofreading interaction at a time against a proofreader server
pub struct StreamingSession {
    client: CompletionClient,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StreamingSession {
    pub fn new(client: CompletionClient, sink: Arc<dyn TextSink>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Idle);
        Self {
            client,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                status,
                sink,
            }),
            task: Mutex::new(None),
        }
    }

    /// Start proofreading `text`, superseding any request still in flight
    ///
    /// The request in flight is cancelled even when validation fails; the
    /// failure is recorded on the session and returned without touching the
    /// network. Must be called from within a Tokio runtime.
    pub fn start(&self, settings: &ProofreadSettings, text: &str) -> Result<(), SessionError> {
        let mut task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let request = match settings.request(text) {
            Ok(request) => request,
            Err(e) => {
                let mut state = self.shared.lock();
                state.generation += 1;
                state.snapshot.error = Some(e.to_string());
                self.shared.set_status(&mut state, SessionStatus::Errored);
                return Err(e);
            }
        };

        let generation = {
            let mut state = self.shared.lock();
            state.generation += 1;
            state.snapshot.text.clear();
            state.snapshot.error = None;
            self.shared.set_status(&mut state, SessionStatus::Streaming);
            state.generation
        };

        tracing::debug!(
            generation,
            model = %request.model,
            chars = request.prompt.chars().count(),
            "Starting proofread"
        );

        let client = self.client.clone();
        let shared = self.shared.clone();
        *task = Some(tokio::spawn(async move {
            let result = stream_completion(&client, &request, &shared, generation).await;
            finish(&shared, generation, result);
        }));

        Ok(())
    }

    /// Abort the request in flight, keeping whatever text was already delivered
    ///
    /// Once this returns, neither the snapshot nor the sink changes until the
    /// next `start`.
    pub fn cancel(&self) {
        let mut task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        {
            let mut state = self.shared.lock();
            state.generation += 1;
            if state.snapshot.status == SessionStatus::Streaming {
                tracing::debug!(chars = state.snapshot.text.chars().count(), "Proofread cancelled");
                self.shared.set_status(&mut state, SessionStatus::Idle);
            }
        }

        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().snapshot.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock().snapshot.status
    }

    /// Wait until the session is no longer streaming
    pub async fn finished(&self) -> SessionSnapshot {
        let mut status = self.shared.status.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = status.wait_for(|s| *s != SessionStatus::Streaming).await;
        self.snapshot()
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn stream_completion(
    client: &CompletionClient,
    request: &CompletionRequest,
    shared: &Shared,
    generation: u64,
) -> Result<(), SessionError> {
    let mut body = client.completion(request).await?;
    let mut decoder = Utf8Decoder::new();

    while let Some(chunk) = body.next().await {
        let text = decoder.push(&chunk?)?;
        if text.is_empty() {
            continue;
        }

        let mut state = shared.lock();
        if state.generation != generation {
            return Ok(());
        }
        state.snapshot.text.push_str(&text);
        shared.sink.replace(&state.snapshot.text);
    }

    decoder.finish()?;
    Ok(())
}

fn finish(shared: &Shared, generation: u64, result: Result<(), SessionError>) {
    let mut state = shared.lock();
    if state.generation != generation {
        return;
    }

    match result {
        Ok(()) => {
            tracing::debug!(chars = state.snapshot.text.chars().count(), "Proofread finished");
            state.snapshot.error = None;
            shared.sink.replace(&state.snapshot.text);
            shared.set_status(&mut state, SessionStatus::Idle);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Proofread failed");
            state.snapshot.error = Some(e.to_string());
            shared.set_status(&mut state, SessionStatus::Errored);
        }
    }
}
