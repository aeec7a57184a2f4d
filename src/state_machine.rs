//! Per-turn state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! transition function decides, the session executes the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::TurnEvent;
pub use state::TurnState;
pub use transition::{transition, TransitionError};
