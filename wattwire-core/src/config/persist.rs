//! Persisted bus configuration
//!
//! A [`BusConfig`] wrapped with a header and CRC so it can be stored as
//! postcard binary data and validated when loaded back.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::bus::{BusConfig, ConfigError};

/// Magic number to identify a stored bus configuration
pub const CONFIG_MAGIC: u32 = 0x5757_4346; // "WWCF"

/// Current record format version
pub const CONFIG_VERSION: u8 = 1;

/// Upper bound on the encoded record size
pub const MAX_RECORD_SIZE: usize = 32;

/// Bus configuration record
///
/// This struct is serialized using postcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfigRecord {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// The stored configuration
    pub config: BusConfig,
    /// CRC32 over magic, version and config fields
    pub crc: u32,
}

impl BusConfigRecord {
    /// Wrap a configuration with a fresh header and CRC
    pub fn new(config: BusConfig) -> Self {
        let mut record = Self {
            magic: CONFIG_MAGIC,
            version: CONFIG_VERSION,
            config,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    /// Calculate CRC32 for the record (excluding the crc field itself)
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.config.reference_hz.to_le_bytes());
        crc = crc32_update(crc, &self.config.bus_hz.to_le_bytes());
        crc = crc32_update(crc, &[self.config.target_address]);
        crc = crc32_update(crc, &self.config.payload_registers);
        !crc
    }

    /// Check header and CRC
    pub fn verify(&self) -> Result<(), ConfigError> {
        if self.magic != CONFIG_MAGIC {
            return Err(ConfigError::InvalidMagic);
        }
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }
        if self.crc != self.calculate_crc() {
            return Err(ConfigError::CrcMismatch);
        }
        Ok(())
    }

    /// Encode this record into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, ConfigError> {
        let used = postcard::to_slice(self, buffer).map_err(|_| ConfigError::BufferTooSmall)?;
        Ok(used.len())
    }

    /// Encode this record into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_RECORD_SIZE>, ConfigError> {
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| ConfigError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode and verify a stored record, returning the configuration
    pub fn decode(bytes: &[u8]) -> Result<BusConfig, ConfigError> {
        let record: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        record.verify()?;
        Ok(record.config)
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
