//! Bus configuration
//!
//! Timing (reference and bus frequencies) and addressing (7-bit target
//! address, registers that take a 16-bit payload on write).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use wattwire_hal::BusSpeed;

use crate::transaction::Direction;

/// Default reference tick frequency (50 MHz)
pub const DEFAULT_REFERENCE_HZ: u32 = 50_000_000;

/// Default target address (all address pins grounded)
pub const DEFAULT_TARGET_ADDRESS: u8 = 0x40;

/// Configuration register pointer
pub const CONFIGURATION_REGISTER: u8 = 0x00;

/// Calibration register pointer
pub const CALIBRATION_REGISTER: u8 = 0x05;

/// Largest valid 7-bit address
pub const MAX_TARGET_ADDRESS: u8 = 0x7F;

/// Smallest divisor that still produces a bus clock
pub const MIN_DIVISOR: u32 = 2;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Reference / bus frequency ratio is below 2
    DivisorTooSmall,
    /// Target address does not fit in 7 bits
    AddressOutOfRange,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Stored bytes could not be deserialized
    Deserialize,
    /// Stored record has the wrong magic number
    InvalidMagic,
    /// Stored record has an unsupported version
    VersionMismatch,
    /// Stored record failed its CRC check
    CrcMismatch,
    /// TOML text could not be parsed
    TomlParse,
}

/// Bus master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusConfig {
    /// Reference tick frequency in Hz
    pub reference_hz: u32,
    /// Target bus clock frequency in Hz
    pub bus_hz: u32,
    /// 7-bit target address
    pub target_address: u8,
    /// Register pointers whose writes carry a 16-bit payload
    pub payload_registers: [u8; 2],
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            reference_hz: DEFAULT_REFERENCE_HZ,
            bus_hz: BusSpeed::STANDARD.frequency,
            target_address: DEFAULT_TARGET_ADDRESS,
            payload_registers: [CONFIGURATION_REGISTER, CALIBRATION_REGISTER],
        }
    }
}

impl BusConfig {
    /// Create a configuration with default addressing
    pub fn new(reference_hz: u32, bus_hz: u32) -> Self {
        Self {
            reference_hz,
            bus_hz,
            ..Self::default()
        }
    }

    /// Use one of the standard bus speeds
    pub fn with_speed(mut self, speed: BusSpeed) -> Self {
        self.bus_hz = speed.frequency;
        self
    }

    /// Use a different target address
    pub fn with_target_address(mut self, address: u8) -> Self {
        self.target_address = address;
        self
    }

    /// Reference ticks per bus clock period (truncated)
    pub fn divisor(&self) -> u32 {
        self.reference_hz.checked_div(self.bus_hz).unwrap_or(0)
    }

    /// First byte on the wire: address followed by the direction bit
    pub fn address_byte(&self, direction: Direction) -> u8 {
        (self.target_address << 1) | direction.bit()
    }

    /// Check if a write to this register pointer carries a payload
    pub fn is_payload_register(&self, pointer: u8) -> bool {
        self.payload_registers.contains(&pointer)
    }

    /// Check the configuration preconditions
    ///
    /// The master does not call this itself; an invalid configuration is
    /// a caller error, not a runtime fault.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.divisor() < MIN_DIVISOR {
            return Err(ConfigError::DivisorTooSmall);
        }
        if self.target_address > MAX_TARGET_ADDRESS {
            return Err(ConfigError::AddressOutOfRange);
        }
        Ok(())
    }

    /// Parse a configuration from a TOML document with a `[bus]` table
    ///
    /// Missing keys take their default values.
    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            bus: BusConfig,
        }

        let document: Document = toml::from_str(text).map_err(|_| ConfigError::TomlParse)?;
        document.bus.validate()?;
        Ok(document.bus)
    }
}
