//! Bus target models

pub mod register;

pub use register::{AckPolicy, Register, RegisterTarget, REGISTER_COUNT};
