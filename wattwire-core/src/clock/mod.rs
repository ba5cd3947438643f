//! Bus clock generation
//!
//! Derives the bus clock from the reference tick and exposes edges as
//! previous/current pulse pairs.

pub mod phase;

pub use phase::{ClockPhase, ClockPhaseGenerator, Edge};
