//! Conversation session
//!
//! Owns the history and the turn state. Every change goes through
//! [`transition`]; the session only executes the returned effects, so the
//! rules about what may be appended live in one place.

use crate::error::{TurnError, TurnErrorKind};
use crate::llm::ChatMessage;
use crate::state_machine::{transition, Effect, TransitionError, TurnEvent, TurnState};
use crate::stream::StreamEvent;

/// What applying a stream event did to the pending turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// New assistant text to echo
    Fragment(String),
    /// The terminator arrived; the turn may be committed
    ReadyToCommit,
    /// Nothing changed (metadata, or lines after the terminator)
    Ignored,
}

/// Ordered conversation history plus the state of the current turn
#[derive(Debug, Clone)]
pub struct ConversationSession {
    history: Vec<ChatMessage>,
    state: TurnState,
}

impl ConversationSession {
    /// Start a session whose first history entry is the system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            history: vec![ChatMessage::system(system_prompt)],
            state: TurnState::Idle,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// Append the user message and open a turn. Returns the turn index.
    pub fn start_turn(&mut self, content: &str) -> Result<usize, TurnError> {
        self.apply(TurnEvent::start(content))?;
        self.state
            .pending()
            .map(|p| p.turn_index)
            .ok_or_else(|| TurnError::InvalidState("turn did not open".to_string()))
    }

    /// Feed one decoded event into the pending turn.
    ///
    /// A malformed line aborts the turn and is returned as
    /// [`TurnError::Parse`].
    pub fn apply_event(&mut self, event: StreamEvent) -> Result<Applied, TurnError> {
        let malformed = match &event {
            StreamEvent::MalformedLine { raw, cause } => Some(TurnError::Parse {
                raw: raw.clone(),
                cause: cause.clone(),
            }),
            _ => None,
        };
        let was_terminated = matches!(self.state, TurnState::Terminated(_));

        let effects = self.apply(TurnEvent::Stream(event))?;
        if let Some(err) = malformed {
            if !was_terminated {
                return Err(err);
            }
        }

        let fragment = effects.into_iter().find_map(|e| match e {
            Effect::DisplayFragment(text) => Some(text),
            _ => None,
        });
        Ok(match fragment {
            Some(text) => Applied::Fragment(text),
            None if !was_terminated && matches!(self.state, TurnState::Terminated(_)) => {
                Applied::ReadyToCommit
            }
            None => Applied::Ignored,
        })
    }

    /// Append the assembled reply. Only valid after the terminator.
    pub fn commit(&mut self) -> Result<(usize, String), TurnError> {
        let effects = self.apply(TurnEvent::Commit)?;
        effects
            .into_iter()
            .find_map(|e| match e {
                Effect::Finalized {
                    turn_index,
                    content,
                } => Some((turn_index, content)),
                _ => None,
            })
            .ok_or_else(|| TurnError::InvalidState("commit produced no reply".to_string()))
    }

    /// Discard the pending turn. A no-op when no turn is pending.
    pub fn abort(&mut self, kind: TurnErrorKind, message: impl Into<String>) {
        if !self.state.has_pending_turn() {
            return;
        }
        if let Err(e) = self.apply(TurnEvent::abort(kind, message)) {
            tracing::error!(error = %e, "Abort rejected by state machine");
        }
    }

    fn apply(&mut self, event: TurnEvent) -> Result<Vec<Effect>, TurnError> {
        let result = transition(&self.state, event).map_err(invalid_state)?;
        self.state = result.new_state;

        let mut remaining = Vec::with_capacity(result.effects.len());
        for effect in result.effects {
            match effect {
                Effect::AppendMessage(message) => self.history.push(message),
                Effect::Discarded {
                    turn_index,
                    kind,
                    message,
                } => {
                    tracing::warn!(
                        turn_index,
                        kind = kind.as_str(),
                        error = %message,
                        "Turn discarded"
                    );
                }
                other => remaining.push(other),
            }
        }
        Ok(remaining)
    }
}

fn invalid_state(e: TransitionError) -> TurnError {
    TurnError::InvalidState(e.to_string())
}
