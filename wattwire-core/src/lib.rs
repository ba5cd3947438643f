//! Board-agnostic core logic for the Wattwire bus master
//!
//! This crate contains everything that does not depend on a specific
//! board or line implementation:
//!
//! - Clock-phase generator (bus clock derived from a reference tick)
//! - Transaction types and the sequencer state machine
//! - [`BusMaster`], which wires the two together over a
//!   [`LineDriver`](wattwire_hal::LineDriver)
//! - Bus configuration and its persisted form
//!
//! Everything is synchronous and tick-driven: the caller advances the
//! master once per reference tick and the master touches the lines only
//! on detected bus clock edges.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod master;
pub mod transaction;

pub use clock::{ClockPhase, ClockPhaseGenerator, Edge};
pub use config::{BusConfig, ConfigError};
pub use master::{BusMaster, ControlInputs, MasterStatus};
pub use transaction::{
    Direction, Sequencer, SequencerState, TransactionError, TransactionRequest, TransactionResult,
};
