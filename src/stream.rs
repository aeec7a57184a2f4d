//! Incremental response reassembly
//!
//! Raw chunks go through [`framer::LineFramer`] (cross-chunk line buffering), then
//! each complete line goes through [`EventDecoder`] to become a typed
//! [`StreamEvent`].

pub mod decoder;
pub mod framer;

#[cfg(test)]
mod proptests;

pub use decoder::EventDecoder;
pub use framer::framed_lines;

use thiserror::Error;

/// A decoded protocol event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant text, never empty
    ContentFragment(String),
    /// The provider will send no further fragments for this turn
    Terminator,
    /// A well-framed line whose payload could not be decoded
    MalformedLine { raw: String, cause: DecodeCause },
}

/// Why a line failed to decode
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeCause {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("provider error: {0}")]
    Provider(String),
}
