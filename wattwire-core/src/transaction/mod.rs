//! Register transactions
//!
//! Request/result types and the sequencer state machine that turns a
//! request into bus line activity.

pub mod sequencer;
pub mod state;
pub mod types;

pub use sequencer::Sequencer;
pub use state::SequencerState;
pub use types::{Direction, TransactionError, TransactionRequest, TransactionResult};
