//! Wattwire Hardware Abstraction Layer
//!
//! This crate defines the traits that sit between the bus master and
//! whatever actually moves the two bus lines: GPIO pins on a real board,
//! or a simulated wired-AND bus on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  wattwire-core (sequencer, BusMaster)   │
//! └─────────────────────────────────────────┘
//!                     │  LineDriver
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  wattwire-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ OpenDrainPin  │       │ SimulatedBus  │
//! │ (embedded-hal)│       │   (host)      │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! Both lines are open-drain: the only legal operations are pulling a line
//! low or releasing it. A released line is pulled high by external bias.
//!
//! # Traits
//!
//! - [`line::OpenDrainLine`], [`line::LineSense`] - A single open-drain line
//! - [`bus::LineDriver`] - Both bus lines, addressed by [`Line`]

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod line;

pub use bus::{BusSpeed, LineDriver, SplitLines};
pub use line::{IoLine, Line, LineSense, OpenDrainLine};
