//! Line drivers and test fixtures
//!
//! This crate provides concrete implementations of the traits defined
//! in wattwire-hal, plus everything needed to run the master on a host:
//!
//! - GPIO line adapter over `embedded-hal` digital pins
//! - Simulated wired-AND bus
//! - Cycle-level model of a 16-bit register sensor
//! - Test bench wiring master, target and bus monitor together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bench;
pub mod gpio;
pub mod sim;
pub mod target;

pub use bench::{BenchError, Completion, TestBench};
pub use gpio::OpenDrainPin;
pub use sim::{BusLevels, SimulatedBus};
pub use target::{AckPolicy, Register, RegisterTarget};
