//! Decoding a chunked response body into text

/// Incremental UTF-8 decoder for a chunked byte stream
///
/// A code point split across two chunks is held back until its remaining
/// bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("response stream contained invalid UTF-8")]
pub struct InvalidUtf8;

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `chunk` as forms complete characters
    pub fn push(&mut self, chunk: &[u8]) -> Result<String, InvalidUtf8> {
        self.pending.extend_from_slice(chunk);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => return Err(InvalidUtf8),
        };

        let rest = self.pending.split_off(valid);
        let decoded = std::mem::replace(&mut self.pending, rest);
        String::from_utf8(decoded).map_err(|_| InvalidUtf8)
    }

    /// End of stream; leftover bytes mean a truncated character
    pub fn finish(self) -> Result<(), InvalidUtf8> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(InvalidUtf8)
        }
    }
}
