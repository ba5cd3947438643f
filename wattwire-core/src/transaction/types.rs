//! Transaction request and result types

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Transfer direction, sent as the last bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Register pointer write, optionally followed by a 16-bit payload
    #[default]
    Write,
    /// 16-bit read from the current register pointer
    Read,
}

impl Direction {
    /// Value of the direction bit on the wire
    pub const fn bit(self) -> u8 {
        match self {
            Direction::Write => 0,
            Direction::Read => 1,
        }
    }
}

/// Transaction parameters
///
/// Captured when the request is accepted and left untouched until the
/// transaction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransactionRequest {
    /// Read or write
    pub direction: Direction,
    /// Register pointer sent after the address byte (writes only)
    pub register: u8,
    /// Payload for registers that take one (writes only)
    pub payload: u16,
}

impl TransactionRequest {
    /// Write a register pointer, plus payload if the register takes one
    pub const fn write(register: u8, payload: u16) -> Self {
        Self {
            direction: Direction::Write,
            register,
            payload,
        }
    }

    /// Set the register pointer without a payload
    pub const fn select(register: u8) -> Self {
        Self::write(register, 0)
    }

    /// Read 16 bits from the current register pointer
    pub const fn read() -> Self {
        Self {
            direction: Direction::Read,
            register: 0,
            payload: 0,
        }
    }
}

/// Errors reported by a completed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionError {
    /// The target left the data line high in an acknowledge window
    AcknowledgeFailed,
}

/// Outcome of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransactionResult {
    /// Word read MSB-first (meaningful for reads without ack failure)
    pub read_payload: u16,
    /// At least one acknowledge window read high
    pub acknowledge_failed: bool,
}

impl TransactionResult {
    /// Convert to a `Result`, yielding the read payload on success
    pub fn into_result(self) -> Result<u16, TransactionError> {
        if self.acknowledge_failed {
            Err(TransactionError::AcknowledgeFailed)
        } else {
            Ok(self.read_payload)
        }
    }
}
