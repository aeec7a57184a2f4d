//! Effects produced by state transitions

use crate::error::TurnErrorKind;
use crate::llm::ChatMessage;

/// Effects to be executed by the session after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the conversation history
    AppendMessage(ChatMessage),

    /// Echo a fragment to the user as soon as it arrives
    DisplayFragment(String),

    /// The turn committed; `content` goes to intervention inspection
    Finalized { turn_index: usize, content: String },

    /// The turn was dropped without an assistant reply
    Discarded {
        turn_index: usize,
        kind: TurnErrorKind,
        message: String,
    },
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendMessage(ChatMessage::user(content))
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendMessage(ChatMessage::assistant(content))
    }

    pub fn discarded(turn_index: usize, kind: TurnErrorKind, message: impl Into<String>) -> Self {
        Effect::Discarded {
            turn_index,
            kind,
            message: message.into(),
        }
    }
}
