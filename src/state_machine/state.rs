//! Turn state types

use crate::error::TurnErrorKind;

/// Accumulator for the assistant reply of the turn in flight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Zero-based index of the turn within the session
    pub turn_index: usize,
    /// Concatenation of every fragment received so far
    pub buffer: String,
}

impl PendingTurn {
    pub fn new(turn_index: usize) -> Self {
        Self {
            turn_index,
            buffer: String::new(),
        }
    }
}

/// Lifecycle of a single turn
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn has been started yet
    #[default]
    Idle,

    /// User message appended, waiting for the first fragment
    AwaitingReply(PendingTurn),

    /// Fragments are arriving
    Streaming(PendingTurn),

    /// Terminator seen, commit not yet performed
    Terminated(PendingTurn),

    /// The assistant reply was appended to history (terminal for the turn)
    Committed { turn_index: usize },

    /// The turn ended without an assistant reply (terminal for the turn)
    Aborted {
        turn_index: usize,
        kind: TurnErrorKind,
    },
}

impl TurnState {
    /// Whether a turn is open. Only one may be open at a time.
    pub fn has_pending_turn(&self) -> bool {
        self.pending().is_some()
    }

    pub fn pending(&self) -> Option<&PendingTurn> {
        match self {
            TurnState::AwaitingReply(pending)
            | TurnState::Streaming(pending)
            | TurnState::Terminated(pending) => Some(pending),
            TurnState::Idle | TurnState::Committed { .. } | TurnState::Aborted { .. } => None,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingReply(_) => "awaiting_reply",
            TurnState::Streaming(_) => "streaming",
            TurnState::Terminated(_) => "terminated",
            TurnState::Committed { .. } => "committed",
            TurnState::Aborted { .. } => "aborted",
        }
    }
}
