//! Relaying upstream text deltas to the client as a plain-text stream

use axum::{
    body::Body,
    http::{header, HeaderName},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::StreamExt;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::config::StatsConfig;
use crate::stats::{format_metrics, CompletionMetrics, StreamOutcome};
use crate::upstream::DeltaStream;

/// Logs the completion metrics when the relay is dropped, however it ended
struct MetricsRecorder {
    metrics: CompletionMetrics,
    start: Instant,
    stats: StatsConfig,
}

impl MetricsRecorder {
    fn chunk(&mut self, text: &str) {
        let elapsed = self.start.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record_chunk(text, elapsed);
    }

    fn finish(&mut self, outcome: StreamOutcome) {
        self.metrics.outcome = outcome;
    }
}

impl Drop for MetricsRecorder {
    fn drop(&mut self) {
        self.metrics.duration_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            request_id = %self.metrics.request_id,
            outcome = self.metrics.outcome.as_str(),
            chunks = self.metrics.chunks,
            "Completion stream closed"
        );

        if self.stats.enabled {
            tracing::info!("{}", format_metrics(&self.metrics, self.stats.format));
        }
    }
}

struct Relay {
    deltas: DeltaStream,
    deadline: Pin<Box<tokio::time::Sleep>>,
    recorder: MetricsRecorder,
    done: bool,
}

/// Wrap an upstream delta stream into the streamed `text/plain` response
///
/// Chunks are forwarded in arrival order without buffering. The body is closed
/// when the upstream stream ends or `timeout` elapses, and aborted if the
/// upstream fails midway so the client sees a broken stream rather than a
/// silently truncated text.
pub fn relay_response(
    deltas: DeltaStream,
    metrics: CompletionMetrics,
    timeout: Duration,
    stats: StatsConfig,
) -> Response {
    let request_id = metrics.request_id.clone();

    let relay = Relay {
        deltas,
        deadline: Box::pin(tokio::time::sleep(timeout)),
        recorder: MetricsRecorder {
            metrics,
            start: Instant::now(),
            stats,
        },
        done: false,
    };

    let stream = futures::stream::unfold(relay, move |mut relay| async move {
        if relay.done {
            return None;
        }

        let next = tokio::select! {
            item = relay.deltas.next() => Some(item),
            _ = &mut relay.deadline => None,
        };

        match next {
            Some(Some(Ok(text))) => {
                relay.recorder.chunk(&text);
                Some((Ok(Bytes::from(text)), relay))
            }
            Some(Some(Err(e))) => {
                tracing::error!(error = %e, "Upstream stream failed");
                relay.recorder.finish(StreamOutcome::UpstreamError);
                relay.done = true;
                Some((Err(std::io::Error::other(e.to_string())), relay))
            }
            Some(None) => {
                relay.recorder.finish(StreamOutcome::Completed);
                None
            }
            None => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "Completion stream hit the duration limit, closing");
                relay.recorder.finish(StreamOutcome::TimedOut);
                None
            }
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
            (HeaderName::from_static("x-request-id"), request_id),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
