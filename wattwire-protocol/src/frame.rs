//! Transfer assembly
//!
//! Groups [`BusEvent`]s into bytes and bytes into transfers. A transfer
//! runs from a start condition to the next stop condition:
//! - address byte: 7-bit address, then the read flag
//! - data bytes, each followed by its acknowledge bit

use heapless::Vec;

use crate::monitor::BusEvent;

/// Maximum number of data bytes kept per transfer
pub const MAX_TRANSFER_BYTES: usize = 8;

/// Errors that can occur while assembling a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Data bit seen outside a start/stop pair
    BitWithoutStart,
    /// Transfer longer than [`MAX_TRANSFER_BYTES`]
    TooManyBytes,
}

/// A data byte and the acknowledge that followed it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedByte {
    /// Byte value, MSB first on the wire
    pub value: u8,
    /// Acknowledge bit was low
    pub acked: bool,
}

/// A complete transfer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transfer {
    /// 7-bit target address
    pub address: u8,
    /// Read flag from the address byte
    pub read: bool,
    /// Address byte was acknowledged
    pub address_acked: bool,
    /// Data bytes in wire order
    pub bytes: Vec<DecodedByte, MAX_TRANSFER_BYTES>,
}

impl Transfer {
    /// Big-endian word made of the bytes at `index` and `index + 1`
    pub fn word(&self, index: usize) -> Option<u16> {
        let hi = self.bytes.get(index)?;
        let lo = self.bytes.get(index + 1)?;
        Some(u16::from_be_bytes([hi.value, lo.value]))
    }

    /// Byte values without acknowledge bits
    pub fn values(&self) -> Vec<u8, MAX_TRANSFER_BYTES> {
        self.bytes.iter().map(|b| b.value).collect()
    }
}

/// State machine assembling transfers from bus events
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    /// Between a start and a stop
    active: bool,
    /// Bits of the current byte
    shift: u8,
    /// Bits received in the current byte, 8 means waiting for the ack
    bits: u8,
    /// Address byte complete
    addressed: bool,
    address: u8,
    read: bool,
    address_acked: bool,
    bytes: Vec<DecodedByte, MAX_TRANSFER_BYTES>,
}

impl FrameDecoder {
    /// Create a new decoder waiting for a start condition
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the decoder state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check if a transfer is in progress
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed a single event to the decoder
    ///
    /// Returns `Ok(Some(transfer))` at the stop condition ending a transfer
    /// with a complete address byte, `Ok(None)` otherwise. A repeated start
    /// drops the partial transfer.
    pub fn feed(&mut self, event: BusEvent) -> Result<Option<Transfer>, DecodeError> {
        match event {
            BusEvent::Start => {
                self.reset();
                self.active = true;
                Ok(None)
            }
            BusEvent::Stop => {
                let transfer = (self.active && self.addressed).then(|| Transfer {
                    address: self.address,
                    read: self.read,
                    address_acked: self.address_acked,
                    bytes: self.bytes.clone(),
                });
                self.reset();
                Ok(transfer)
            }
            BusEvent::Bit(_) if !self.active => Err(DecodeError::BitWithoutStart),
            BusEvent::Bit(level) if self.bits < 8 => {
                self.shift = (self.shift << 1) | level as u8;
                self.bits += 1;
                Ok(None)
            }
            BusEvent::Bit(level) => {
                let acked = !level;
                let value = self.shift;
                self.shift = 0;
                self.bits = 0;

                if !self.addressed {
                    self.addressed = true;
                    self.address = value >> 1;
                    self.read = value & 1 == 1;
                    self.address_acked = acked;
                    return Ok(None);
                }

                if self.bytes.push(DecodedByte { value, acked }).is_err() {
                    self.reset();
                    return Err(DecodeError::TooManyBytes);
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple events to the decoder
    ///
    /// Returns the first complete transfer found, if any.
    /// Remaining events after a complete transfer are not consumed.
    pub fn feed_events(&mut self, events: &[BusEvent]) -> Result<Option<Transfer>, DecodeError> {
        for &event in events {
            if let Some(transfer) = self.feed(event)? {
                return Ok(Some(transfer));
            }
        }
        Ok(None)
    }
}
