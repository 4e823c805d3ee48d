//! Request logging formatter

use crate::api::CompletionRequest;

/// Format a completion request log message in compact format
///
/// Never includes the caller's key or endpoint.
pub fn format_request_log(request: &CompletionRequest) -> String {
    let mut parts = vec![
        format!("model={}", request.model),
        format!("context={}", request.context),
        format!("instruction={}", request.instruction),
        format!("chars={}", request.prompt.chars().count()),
    ];

    if !request.endpoint.is_empty() {
        parts.push("custom-endpoint".to_string());
    }

    let text = normalize_whitespace(&request.prompt);
    if !text.is_empty() {
        parts.push(format!("\"{}\"", truncate_message(&text)));
    }

    format!("→ {}", parts.join(" "))
}

/// Convert newlines and tabs to single spaces, collapse multiple spaces
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate message according to rules:
/// - If <= 100 chars: show all
/// - If > 100 chars: first 25 + " ... " + last 75
fn truncate_message(s: &str) -> String {
    const MAX_TOTAL: usize = 100;
    const PREFIX_LEN: usize = 25;
    const SUFFIX_LEN: usize = 75;
    const ELLIPSIS: &str = " ... ";

    let count = s.chars().count();
    if count <= MAX_TOTAL {
        return s.to_string();
    }

    let prefix: String = s.chars().take(PREFIX_LEN).collect();
    let suffix: String = s.chars().skip(count - SUFFIX_LEN).collect();

    format!("{}{}{}", prefix, ELLIPSIS, suffix)
}
