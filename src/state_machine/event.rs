//! Events that can occur during a turn

use crate::error::TurnErrorKind;
use crate::stream::StreamEvent;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// The user submitted a message
    StartTurn { content: String },

    /// A decoded stream event arrived
    Stream(StreamEvent),

    /// Finalize the reply after the terminator
    Commit,

    /// The byte source failed, closed early, or was cancelled
    Abort { kind: TurnErrorKind, message: String },
}

impl TurnEvent {
    pub fn start(content: impl Into<String>) -> Self {
        TurnEvent::StartTurn {
            content: content.into(),
        }
    }

    #[cfg(test)]
    pub fn fragment(text: impl Into<String>) -> Self {
        TurnEvent::Stream(StreamEvent::ContentFragment(text.into()))
    }

    #[cfg(test)]
    pub fn terminator() -> Self {
        TurnEvent::Stream(StreamEvent::Terminator)
    }

    pub fn abort(kind: TurnErrorKind, message: impl Into<String>) -> Self {
        TurnEvent::Abort {
            kind,
            message: message.into(),
        }
    }
}
