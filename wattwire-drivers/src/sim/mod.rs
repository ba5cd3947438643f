//! Host-side bus simulation

pub mod bus;

pub use bus::{BusLevels, SimulatedBus};
