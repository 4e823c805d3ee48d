//! Stats formatting for different output formats

use super::CompletionMetrics;
use crate::config::StatsFormat;

/// Format metrics according to the configured format
pub fn format_metrics(metrics: &CompletionMetrics, format: StatsFormat) -> String {
    match format {
        StatsFormat::Pretty => format_pretty(metrics),
        StatsFormat::Json => format_json(metrics),
        StatsFormat::Compact => format_compact(metrics),
    }
}

/// Pretty box format for terminal output
fn format_pretty(m: &CompletionMetrics) -> String {
    let user = m.user.as_deref().unwrap_or("(own key)");
    let first_chunk = m
        .first_chunk_ms
        .map(|ms| format!("{:.1}ms", ms))
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"┌──────────────────────────────────────────────────────────────────┐
│ Proofread Completion                                             │
├──────────────────────────────────────────────────────────────────┤
│ Model: {:58}│
│ User:  {:58}│
│ Style: {:58}│
│ Time:  {:58}│
├──────────────────────────────────────────────────────────────────┤
│ Input: {:8} chars │ Output: {:8} chars │ Chunks: {:6}  │
│ First chunk: {:52}│
│ Throughput: {:10.1} chars/sec                                  │
├──────────────────────────────────────────────────────────────────┤
│ Outcome: {:56}│
│ Duration: {:53.1}ms│
└──────────────────────────────────────────────────────────────────┘
"#,
        truncate(&m.model, 58),
        truncate(user, 58),
        truncate(&format!("{}/{}", m.context, m.instruction), 58),
        m.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        m.input_len,
        m.output_len,
        m.chunks,
        first_chunk,
        m.chars_per_second(),
        m.outcome.as_str(),
        m.duration_ms,
    )
}

/// JSON format for structured logging
fn format_json(m: &CompletionMetrics) -> String {
    serde_json::to_string(m).unwrap_or_else(|_| "{}".to_string())
}

/// Compact single-line format
fn format_compact(m: &CompletionMetrics) -> String {
    format!(
        "[{}] model={} user={} style={}/{} chars={}/{} chunks={} {} dur={:.1}ms",
        m.timestamp.format("%H:%M:%S"),
        m.model,
        m.user.as_deref().unwrap_or("-"),
        m.context,
        m.instruction,
        m.input_len,
        m.output_len,
        m.chunks,
        m.outcome.as_str(),
        m.duration_ms
    )
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StreamOutcome;

    fn metrics() -> CompletionMetrics {
        let mut m = CompletionMetrics::new("test-model", "email", "polish", Some("alice".to_string()), 100);
        m.output_len = 120;
        m.chunks = 14;
        m.duration_ms = 1200.0;
        m.outcome = StreamOutcome::Completed;
        m
    }

    #[test]
    fn test_format_compact() {
        let output = format_compact(&metrics());
        assert!(output.contains("model=test-model"));
        assert!(output.contains("user=alice"));
        assert!(output.contains("style=email/polish"));
        assert!(output.contains("chars=100/120"));
        assert!(output.contains("completed"));
    }

    #[test]
    fn test_format_json() {
        let output = format_metrics(&metrics(), StatsFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["chunks"], 14);
        assert_eq!(json["outcome"], "completed");
    }

    #[test]
    fn test_format_pretty() {
        let output = format_metrics(&metrics(), StatsFormat::Pretty);
        assert!(output.contains("Proofread Completion"));
        assert!(output.contains("alice"));
        assert!(output.contains("completed"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
