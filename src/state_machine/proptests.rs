//! Property-based tests for the turn state machine
//!
//! These tests verify key invariants hold across all possible event orders.

use super::*;
use crate::error::TurnErrorKind;
use crate::llm::types::Role;
use crate::llm::ChatMessage;
use crate::stream::{DecodeCause, StreamEvent};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_error_kind() -> impl Strategy<Value = TurnErrorKind> {
    prop_oneof![
        Just(TurnErrorKind::Framing),
        Just(TurnErrorKind::Parse),
        Just(TurnErrorKind::Transport),
    ]
}

fn arb_stream_event() -> impl Strategy<Value = StreamEvent> {
    prop_oneof![
        4 => "[a-zA-Z _.!?]{1,12}".prop_map(StreamEvent::ContentFragment),
        1 => Just(StreamEvent::Terminator),
        1 => "[a-z{\":]{0,12}".prop_map(|raw| StreamEvent::MalformedLine {
            cause: DecodeCause::InvalidJson("bad".to_string()),
            raw,
        }),
    ]
}

fn arb_event() -> impl Strategy<Value = TurnEvent> {
    prop_oneof![
        2 => "[a-zA-Z ]{0,20}".prop_map(|content| TurnEvent::StartTurn { content }),
        6 => arb_stream_event().prop_map(TurnEvent::Stream),
        2 => Just(TurnEvent::Commit),
        1 => (arb_error_kind(), "[a-z ]{1,20}")
            .prop_map(|(kind, message)| TurnEvent::Abort { kind, message }),
    ]
}

/// A well-behaved turn: start, fragments, terminator, commit
fn arb_complete_turn() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        "[a-zA-Z ]{1,20}",
        proptest::collection::vec("[a-zA-Z0-9 _]{1,8}", 0..10),
    )
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Default)]
struct Simulation {
    state: TurnState,
    history: Vec<ChatMessage>,
    displayed: String,
    starts: usize,
    commits: usize,
    finalized: Vec<String>,
}

impl Simulation {
    fn new() -> Self {
        Self {
            history: vec![ChatMessage::system("system")],
            ..Self::default()
        }
    }

    fn apply(&mut self, event: TurnEvent) -> Result<(), TransitionError> {
        let prior = self.state.clone();
        let is_start = matches!(event, TurnEvent::StartTurn { .. });
        let is_commit = matches!(event, TurnEvent::Commit);

        let result = transition(&self.state, event)?;
        if is_start {
            self.starts += 1;
            self.displayed.clear();
        }
        if is_commit {
            assert!(
                matches!(prior, TurnState::Terminated(_)),
                "Commit accepted from {prior:?}"
            );
            self.commits += 1;
        }

        for effect in result.effects {
            match effect {
                Effect::AppendMessage(message) => self.history.push(message),
                Effect::DisplayFragment(text) => self.displayed.push_str(&text),
                Effect::Finalized { content, .. } => self.finalized.push(content),
                Effect::Discarded { .. } => {}
            }
        }
        self.state = result.new_state;
        Ok(())
    }

    fn assistant_count(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: history shape survives any event order
    #[test]
    fn prop_history_shape_preserved(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut sim = Simulation::new();
        for event in events {
            let _ = sim.apply(event);
        }

        prop_assert_eq!(sim.history[0].role, Role::System);
        prop_assert!(sim.history[1..].iter().all(|m| m.role != Role::System));
        if sim.history.len() > 1 {
            prop_assert_eq!(sim.history[1].role, Role::User);
        }
        // Every assistant message answers the user message right before it
        for pair in sim.history.windows(2) {
            if pair[1].role == Role::Assistant {
                prop_assert_eq!(pair[0].role, Role::User);
            }
        }
    }

    // Invariant 2: exactly one assistant message per commit, never more than one per turn
    #[test]
    fn prop_one_assistant_message_per_commit(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut sim = Simulation::new();
        for event in events {
            let _ = sim.apply(event);
        }

        prop_assert_eq!(sim.assistant_count(), sim.commits);
        prop_assert!(sim.commits <= sim.starts);
        prop_assert_eq!(sim.finalized.len(), sim.commits);
    }

    // Invariant 3: an abort never appends to history
    #[test]
    fn prop_abort_never_appends(
        events in proptest::collection::vec(arb_event(), 0..30),
        kind in arb_error_kind(),
    ) {
        let mut sim = Simulation::new();
        for event in events {
            let _ = sim.apply(event);
        }

        let before = sim.history.len();
        if sim.apply(TurnEvent::abort(kind, "stop")).is_ok() {
            prop_assert_eq!(sim.history.len(), before);
            let is_aborted = matches!(sim.state, TurnState::Aborted { .. });
            prop_assert!(is_aborted);
        }
    }

    // Invariant 4: only one turn can be open at a time
    #[test]
    fn prop_start_rejected_while_pending(
        events in proptest::collection::vec(arb_event(), 0..30),
        text in "[a-z]{1,10}",
    ) {
        let mut sim = Simulation::new();
        for event in events {
            let _ = sim.apply(event);
        }

        let was_pending = sim.state.has_pending_turn();
        let result = sim.apply(TurnEvent::start(text));
        if was_pending {
            prop_assert_eq!(result, Err(TransitionError::TurnInProgress));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    // Invariant 5: committed content equals everything displayed during the turn
    #[test]
    fn prop_committed_content_matches_display(turns in proptest::collection::vec(arb_complete_turn(), 1..5)) {
        let mut sim = Simulation::new();
        for (user, fragments) in &turns {
            sim.apply(TurnEvent::start(user.clone())).unwrap();
            for fragment in fragments {
                sim.apply(TurnEvent::fragment(fragment.clone())).unwrap();
            }
            sim.apply(TurnEvent::terminator()).unwrap();
            sim.apply(TurnEvent::Commit).unwrap();

            prop_assert_eq!(sim.finalized.last().unwrap(), &fragments.concat());
            prop_assert_eq!(&sim.displayed, &fragments.concat());
        }

        prop_assert_eq!(sim.history.len(), 1 + 2 * turns.len());
        prop_assert_eq!(sim.assistant_count(), turns.len());
    }

    // Invariant 6: Committed and Aborted accept no stream events
    #[test]
    fn prop_terminal_states_ignore_stream(event in arb_stream_event(), index in 0usize..10) {
        for state in [
            TurnState::Committed { turn_index: index },
            TurnState::Aborted { turn_index: index, kind: TurnErrorKind::Transport },
        ] {
            let result = transition(&state, TurnEvent::Stream(event.clone()));
            let rejected = matches!(result, Err(TransitionError::InvalidTransition(_)));
            prop_assert!(rejected);
        }
    }
}
