//! Pure state transition function
//!
//! Given the same state and event this always produces the same result and
//! performs no I/O. The session applies the returned effects.

use super::state::PendingTurn;
use super::{Effect, TurnEvent, TurnState};
use crate::error::TurnErrorKind;
use crate::stream::StreamEvent;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A turn is already in progress")]
    TurnInProgress,
    #[error("User message is empty")]
    EmptyUserContent,
    #[error("Turn is not ready to commit (state: {0})")]
    NotReadyToCommit(&'static str),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(state: &TurnState, event: TurnEvent) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Turn start
        // ============================================================
        (_, TurnEvent::StartTurn { content }) if content.is_empty() => {
            Err(TransitionError::EmptyUserContent)
        }

        (
            TurnState::Idle | TurnState::Committed { .. } | TurnState::Aborted { .. },
            TurnEvent::StartTurn { content },
        ) => {
            let turn_index = next_turn_index(state);
            Ok(TransitionResult::new(TurnState::AwaitingReply(PendingTurn::new(turn_index)))
                .with_effect(Effect::append_user(content)))
        }

        (
            TurnState::AwaitingReply(_) | TurnState::Streaming(_) | TurnState::Terminated(_),
            TurnEvent::StartTurn { .. },
        ) => Err(TransitionError::TurnInProgress),

        // ============================================================
        // Stream events
        // ============================================================
        (
            TurnState::AwaitingReply(pending) | TurnState::Streaming(pending),
            TurnEvent::Stream(StreamEvent::ContentFragment(text)),
        ) => {
            let mut pending = pending.clone();
            pending.buffer.push_str(&text);
            Ok(TransitionResult::new(TurnState::Streaming(pending))
                .with_effect(Effect::DisplayFragment(text)))
        }

        (
            TurnState::AwaitingReply(pending) | TurnState::Streaming(pending),
            TurnEvent::Stream(StreamEvent::Terminator),
        ) => Ok(TransitionResult::new(TurnState::Terminated(pending.clone()))),

        (
            TurnState::AwaitingReply(pending) | TurnState::Streaming(pending),
            TurnEvent::Stream(StreamEvent::MalformedLine { cause, .. }),
        ) => Ok(abort(pending, TurnErrorKind::Parse, cause.to_string())),

        // Providers may send trailing lines after the terminator
        (TurnState::Terminated(_), TurnEvent::Stream(_)) => {
            Ok(TransitionResult::new(state.clone()))
        }

        // ============================================================
        // Commit
        // ============================================================
        (TurnState::Terminated(pending), TurnEvent::Commit) => {
            let content = pending.buffer.clone();
            Ok(TransitionResult::new(TurnState::Committed {
                turn_index: pending.turn_index,
            })
            .with_effect(Effect::append_assistant(content.clone()))
            .with_effect(Effect::Finalized {
                turn_index: pending.turn_index,
                content,
            }))
        }

        (state, TurnEvent::Commit) => Err(TransitionError::NotReadyToCommit(state.name())),

        // ============================================================
        // Abort
        // ============================================================
        (
            TurnState::AwaitingReply(pending)
            | TurnState::Streaming(pending)
            | TurnState::Terminated(pending),
            TurnEvent::Abort { kind, message },
        ) => Ok(abort(pending, kind, message)),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {:?}",
            state.name(),
            event
        ))),
    }
}

fn abort(pending: &PendingTurn, kind: TurnErrorKind, message: String) -> TransitionResult {
    TransitionResult::new(TurnState::Aborted {
        turn_index: pending.turn_index,
        kind,
    })
    .with_effect(Effect::discarded(pending.turn_index, kind, message))
}

fn next_turn_index(state: &TurnState) -> usize {
    match state {
        TurnState::Committed { turn_index } | TurnState::Aborted { turn_index, .. } => turn_index + 1,
        TurnState::Idle
        | TurnState::AwaitingReply(_)
        | TurnState::Streaming(_)
        | TurnState::Terminated(_) => 0,
    }
}
