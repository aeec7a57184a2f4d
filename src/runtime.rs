//! Runtime for driving conversation turns
//!
//! The orchestrator owns the session and pumps each reply from the transport
//! through framing and decoding, one turn at a time.

mod executor;
pub mod traits;


pub use executor::TurnOrchestrator;
pub use traits::*;
