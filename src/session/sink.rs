//! Observers of a session's growing text

use std::sync::{Arc, Mutex};

/// Destination for streamed text
///
/// `replace` always receives the full accumulated text, never a delta. It is
/// called while the session holds its state lock, so implementations must not
/// call back into the session.
pub trait TextSink: Send + Sync {
    fn replace(&self, text: &str);
}

impl<F> TextSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn replace(&self, text: &str) {
        self(text)
    }
}

/// In-memory text buffer, the simplest sink
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    inner: Arc<Mutex<BufferState>>,
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    updates: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.lock().text.clone()
    }

    /// Number of times the buffer has been replaced
    pub fn updates(&self) -> usize {
        self.lock().updates
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BufferState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TextSink for TextBuffer {
    fn replace(&self, text: &str) {
        let mut state = self.lock();
        state.text.clear();
        state.text.push_str(text);
        state.updates += 1;
    }
}
