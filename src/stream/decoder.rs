//! Protocol line decoding

use super::{DecodeCause, StreamEvent};
use crate::llm::types::ChatCompletionChunk;

/// Framing prefix of a data line
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends the stream
pub const DONE_TOKEN: &str = "[DONE]";

/// Turns one complete line into at most one [`StreamEvent`]
#[derive(Debug, Clone)]
pub struct EventDecoder {
    prefix: String,
    terminator: String,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(DATA_PREFIX, DONE_TOKEN)
    }
}

impl EventDecoder {
    pub fn new(prefix: impl Into<String>, terminator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            terminator: terminator.into(),
        }
    }

    /// Decode a line. `None` means the line carries nothing for the turn:
    /// blank lines, SSE comments, and metadata-only payloads.
    pub fn decode(&self, line: &str) -> Option<StreamEvent> {
        let trimmed = line.trim();
        // SSE comment, e.g. gateway keep-alives
        if trimmed.starts_with(':') {
            return None;
        }

        let payload = trimmed
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(trimmed)
            .trim();
        if payload.is_empty() {
            return None;
        }
        if payload == self.terminator {
            return Some(StreamEvent::Terminator);
        }

        let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, line = %line, "Undecodable stream line");
                return Some(StreamEvent::MalformedLine {
                    raw: line.to_string(),
                    cause: DecodeCause::InvalidJson(e.to_string()),
                });
            }
        };

        if let Some(error) = chunk.error {
            tracing::warn!(error = %error.message, "Provider reported an error mid-stream");
            return Some(StreamEvent::MalformedLine {
                raw: line.to_string(),
                cause: DecodeCause::Provider(error.message),
            });
        }

        chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|text| !text.is_empty())
            .map(StreamEvent::ContentFragment)
    }
}
