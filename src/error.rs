//! Turn-level error taxonomy

use crate::llm::LlmError;
use crate::stream::DecodeCause;
use thiserror::Error;

/// Line framing failure. Fatal to the current turn.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("Stream line is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("Stream line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },
}

/// Why a turn did not commit. Every variant aborts only the pending turn;
/// committed history is never touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("Malformed stream line ({cause}): {raw}")]
    Parse { raw: String, cause: DecodeCause },

    #[error("Transport error: {0}")]
    Transport(#[from] LlmError),

    #[error("Stream ended before the terminator")]
    StreamClosed,

    #[error("Invalid turn state: {0}")]
    InvalidState(String),
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnErrorKind {
    Framing,
    Parse,
    Transport,
    InvalidState,
}

impl TurnErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnErrorKind::Framing => "framing",
            TurnErrorKind::Parse => "parse",
            TurnErrorKind::Transport => "transport",
            TurnErrorKind::InvalidState => "invalid_state",
        }
    }
}

impl TurnError {
    pub fn kind(&self) -> TurnErrorKind {
        match self {
            TurnError::Framing(_) => TurnErrorKind::Framing,
            TurnError::Parse { .. } => TurnErrorKind::Parse,
            TurnError::Transport(_) | TurnError::StreamClosed => TurnErrorKind::Transport,
            TurnError::InvalidState(_) => TurnErrorKind::InvalidState,
        }
    }

    /// Programming errors are not recoverable by the user; everything else
    /// leaves the session ready for the next turn.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != TurnErrorKind::InvalidState
    }
}
