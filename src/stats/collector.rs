//! Metrics collected while relaying one completion stream

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How a relayed stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOutcome {
    Completed,
    UpstreamError,
    TimedOut,
    /// The client went away before the stream ended
    Dropped,
}

impl StreamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamOutcome::Completed => "completed",
            StreamOutcome::UpstreamError => "upstream_error",
            StreamOutcome::TimedOut => "timed_out",
            StreamOutcome::Dropped => "dropped",
        }
    }
}

/// Collected metrics from a completion request/stream cycle
#[derive(Debug, Clone, Serialize)]
pub struct CompletionMetrics {
    /// Unique request ID
    pub request_id: String,
    /// Timestamp of the request
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub context: String,
    pub instruction: String,
    /// Provisioned user name, if any
    pub user: Option<String>,
    /// Input length (characters)
    pub input_len: usize,
    /// Output length (characters)
    pub output_len: usize,
    /// Number of deltas relayed
    pub chunks: usize,
    /// Time until the first delta in ms
    pub first_chunk_ms: Option<f64>,
    /// Request duration in ms
    pub duration_ms: f64,
    pub outcome: StreamOutcome,
}

impl CompletionMetrics {
    pub fn new(model: &str, context: &str, instruction: &str, user: Option<String>, input_len: usize) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model: model.to_string(),
            context: context.to_string(),
            instruction: instruction.to_string(),
            user,
            input_len,
            output_len: 0,
            chunks: 0,
            first_chunk_ms: None,
            duration_ms: 0.0,
            outcome: StreamOutcome::Dropped,
        }
    }

    /// Account for one relayed delta
    pub fn record_chunk(&mut self, text: &str, elapsed_ms: f64) {
        if self.first_chunk_ms.is_none() {
            self.first_chunk_ms = Some(elapsed_ms);
        }
        self.chunks += 1;
        self.output_len += text.chars().count();
    }

    /// Output characters per second over the whole stream
    pub fn chars_per_second(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 0.0;
        }
        self.output_len as f64 / (self.duration_ms / 1000.0)
    }
}
