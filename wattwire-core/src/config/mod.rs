//! Configuration types
//!
//! Bus timing and target addressing. With the `serde` feature the
//! configuration can be stored as postcard binary data, and with the `toml`
//! feature it can be parsed from a `[bus]` table.

pub mod bus;
#[cfg(feature = "serde")]
pub mod persist;

pub use bus::*;
#[cfg(feature = "serde")]
pub use persist::*;
