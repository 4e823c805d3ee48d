//! Ordered strategies for turning the raw configuration value into a document

use base64::Engine;
use std::path::Path;

/// Result of asking one source for the credential document
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// The source produced the document text
    Loaded(String),
    /// The source does not apply to this input; the next one is tried
    Declined(String),
}

/// A way of interpreting the raw configuration value
pub trait DocumentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn load(&self, input: &str) -> SourceOutcome;
}

/// Treats the input as a path to a readable file
pub struct FileSource;

impl DocumentSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self, input: &str) -> SourceOutcome {
        let path = Path::new(input.trim());
        if !path.is_file() {
            return SourceOutcome::Declined(format!("{} is not a file", path.display()));
        }
        match std::fs::read_to_string(path) {
            Ok(content) => SourceOutcome::Loaded(content),
            Err(e) => SourceOutcome::Declined(format!("failed to read {}: {}", path.display(), e)),
        }
    }
}

/// Treats the input as a base64-encoded inline document
pub struct Base64Source;

impl DocumentSource for Base64Source {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn load(&self, input: &str) -> SourceOutcome {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
            Ok(bytes) => bytes,
            Err(e) => return SourceOutcome::Declined(format!("invalid base64: {}", e)),
        };
        match String::from_utf8(bytes) {
            Ok(content) if content.trim().is_empty() => {
                SourceOutcome::Declined("decoded document is empty".to_string())
            }
            Ok(content) => SourceOutcome::Loaded(content),
            Err(_) => SourceOutcome::Declined("decoded document is not valid UTF-8".to_string()),
        }
    }
}

/// File path first, then inline base64
pub fn default_sources() -> Vec<Box<dyn DocumentSource>> {
    vec![Box::new(FileSource), Box::new(Base64Source)]
}
