//! Wattwire bus waveform decoding
//!
//! Turns sampled line levels back into the transfers they carry, without
//! taking part in the bus. Used to check what a master actually put on the
//! wire.
//!
//! # Signalling
//!
//! ```text
//!         start   bit     bit           stop
//! data  ‾‾‾\____X=====X=====X ... __/‾‾‾‾
//! clock ‾‾‾‾‾‾\__/‾‾\__/‾‾\__ ... /‾‾‾‾‾‾
//! ```
//!
//! - Start: data falls while the clock stays high
//! - Stop: data rises while the clock stays high
//! - Bit: data level at a clock rise, confirmed by the following clock fall
//!
//! Each byte is 8 bits MSB-first followed by an acknowledge bit (low = ack).
//! The first byte of a transfer is the 7-bit address plus the read flag.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod monitor;

pub use frame::{DecodeError, DecodedByte, FrameDecoder, Transfer, MAX_TRANSFER_BYTES};
pub use monitor::{BusEvent, BusMonitor};
