//! Transaction sequencer
//!
//! Walks a [`TransactionRequest`] through the bus phases, one bit per bus
//! clock period. Every line operation happens inside an edge handler:
//!
//! - falling edge: clock pulled low, then the data line is updated
//! - rising edge: clock released, then the data line is sampled
//!
//! so the data line only ever changes while the clock is low, and is only
//! read once the clock is high. The one exception is the stop sequence,
//! where the data line is released after the clock drive has been let go.
//!
//! Bit indices count down: 7 is the MSB of a byte, 15 the MSB of a word.

use wattwire_hal::{Line, LineDriver};

use super::state::SequencerState;
use super::types::{Direction, TransactionRequest, TransactionResult};
use crate::clock::{ClockPhase, Edge};
use crate::config::BusConfig;

/// MSB of a byte
const BYTE_MSB: u8 = 7;

/// MSB of a 16-bit word
const WORD_MSB: u8 = 15;

/// LSB of the high byte of a word
const HIGH_BYTE_LSB: u8 = 8;

/// Transaction sequencer
///
/// Owns no lines itself; the caller passes the [`LineDriver`] into each
/// [`step`](Self::step).
#[derive(Debug, Clone)]
pub struct Sequencer {
    /// Addressing used to build the first byte and pick payload registers
    config: BusConfig,
    /// Current state
    state: SequencerState,
    /// Request being executed (valid while busy)
    request: TransactionRequest,
    /// Address byte for the current request
    address_byte: u8,
    /// Bit index within the current byte or word
    bit: u8,
    /// Request accepted, start condition not issued yet
    pending: bool,
    /// A transaction is in flight
    busy: bool,
    /// Clock line follows the bus clock
    clock_engaged: bool,
    /// Next rising edge samples a target acknowledge
    ack_window: bool,
    /// Sticky acknowledge failure for the current transaction
    ack_failed: bool,
    /// Read shift register
    shift: u16,
    /// Last completed read
    read_payload: u16,
    /// Done pulse, high for the single tick that completes a transaction
    done: bool,
}

impl Sequencer {
    /// Create a new sequencer in the ready state
    pub fn new(config: &BusConfig) -> Self {
        Self {
            config: *config,
            state: SequencerState::Ready,
            request: TransactionRequest::default(),
            address_byte: 0,
            bit: BYTE_MSB,
            pending: false,
            busy: false,
            clock_engaged: false,
            ack_window: false,
            ack_failed: false,
            shift: 0,
            read_payload: 0,
            done: false,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Check if a transaction is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Check if a transaction completed on the last step
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Check if an acknowledge window read high
    pub fn ack_failed(&self) -> bool {
        self.ack_failed
    }

    /// Word from the last completed read
    pub fn read_payload(&self) -> u16 {
        self.read_payload
    }

    /// Current bit index
    pub fn bit_index(&self) -> u8 {
        self.bit
    }

    /// Request currently (or most recently) executed
    pub fn request(&self) -> &TransactionRequest {
        &self.request
    }

    /// Snapshot of the result outputs
    pub fn result(&self) -> TransactionResult {
        TransactionResult {
            read_payload: self.read_payload,
            acknowledge_failed: self.ack_failed,
        }
    }

    /// Accept a new request
    ///
    /// Returns false, leaving the in-flight transaction untouched, if
    /// the sequencer is busy. The start condition is issued on the next
    /// falling edge.
    pub fn accept(&mut self, request: TransactionRequest) -> bool {
        if self.busy {
            #[cfg(feature = "defmt")]
            defmt::warn!("start ignored, transaction in flight");
            return false;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "accepted {} register {:#x}",
            request.direction,
            request.register
        );

        self.request = request;
        self.address_byte = self.config.address_byte(request.direction);
        self.busy = true;
        self.pending = true;
        self.ack_failed = false;
        self.shift = 0;
        true
    }

    /// Synchronous reset
    ///
    /// Returns to ready from any state, releasing both lines and clearing
    /// busy and the acknowledge flag.
    pub fn reset<L: LineDriver>(&mut self, lines: &mut L) {
        lines.release_all();
        self.state = SequencerState::Ready;
        self.bit = BYTE_MSB;
        self.pending = false;
        self.busy = false;
        self.clock_engaged = false;
        self.ack_window = false;
        self.ack_failed = false;
        self.shift = 0;
        self.read_payload = 0;
        self.done = false;
    }

    /// Advance by one reference tick
    ///
    /// Does nothing unless `phase` carries an edge. The done pulse from the
    /// previous tick is cleared first.
    pub fn step<L: LineDriver>(&mut self, phase: ClockPhase, lines: &mut L) {
        self.done = false;

        match phase.edge() {
            Some(Edge::Falling) => self.on_falling(lines),
            Some(Edge::Rising) => self.on_rising(lines),
            None => {}
        }
    }

    fn on_rising<L: LineDriver>(&mut self, lines: &mut L) {
        if self.clock_engaged {
            lines.release(Line::Clock);
        }

        let data_high = lines.is_high(Line::Data);

        if self.ack_window {
            self.ack_window = false;
            if data_high {
                #[cfg(feature = "defmt")]
                defmt::warn!("no acknowledge in {}", self.state);
                self.ack_failed = true;
            }
        }

        match self.state {
            // Bits 15 and 7 are the acknowledge clocks around the first byte
            SequencerState::Read if self.bit != WORD_MSB && self.bit != BYTE_MSB => {
                self.shift_in(data_high);
            }
            SequencerState::MasterAck => self.shift_in(data_high),
            // Let the clock float high; data is released on the next fall
            SequencerState::EndTransaction => self.clock_engaged = false,
            SequencerState::Ready
            | SequencerState::Start
            | SequencerState::Command
            | SequencerState::SlaveAck1
            | SequencerState::Write
            | SequencerState::WriteRegister
            | SequencerState::SlaveAck2
            | SequencerState::Read
            | SequencerState::Stop => {}
        }
    }

    fn on_falling<L: LineDriver>(&mut self, lines: &mut L) {
        if self.clock_engaged {
            lines.drive_low(Line::Clock);
        }

        let next = match self.state {
            SequencerState::Ready => {
                if self.pending {
                    // Clock is still released here, so this is the start
                    // condition. The clock is first pulled on the next fall.
                    self.pending = false;
                    self.clock_engaged = true;
                    self.bit = BYTE_MSB;
                    lines.drive_low(Line::Data);
                    SequencerState::Start
                } else {
                    SequencerState::Ready
                }
            }
            SequencerState::Start => {
                self.send_bit(lines, self.address_byte as u16);
                self.bit -= 1;
                SequencerState::Command
            }
            SequencerState::Command => {
                self.send_bit(lines, self.address_byte as u16);
                if self.bit == 0 {
                    SequencerState::SlaveAck1
                } else {
                    self.bit -= 1;
                    SequencerState::Command
                }
            }
            SequencerState::SlaveAck1 => {
                self.open_ack_window(lines);
                match self.request.direction {
                    Direction::Read => {
                        self.bit = WORD_MSB;
                        SequencerState::Read
                    }
                    Direction::Write => {
                        self.bit = BYTE_MSB;
                        SequencerState::Write
                    }
                }
            }
            SequencerState::Write => {
                self.send_bit(lines, self.request.register as u16);
                if self.bit == 0 {
                    // Zero here means pointer-only: stop after the next ack
                    self.bit = if self.config.is_payload_register(self.request.register) {
                        WORD_MSB
                    } else {
                        0
                    };
                    SequencerState::SlaveAck2
                } else {
                    self.bit -= 1;
                    SequencerState::Write
                }
            }
            SequencerState::WriteRegister => {
                self.send_bit(lines, self.request.payload);
                let byte_end = self.bit == HIGH_BYTE_LSB || self.bit == 0;
                self.bit = self.bit.saturating_sub(1);
                if byte_end {
                    SequencerState::SlaveAck2
                } else {
                    SequencerState::WriteRegister
                }
            }
            SequencerState::SlaveAck2 => {
                self.open_ack_window(lines);
                if self.bit == WORD_MSB || self.bit == BYTE_MSB {
                    SequencerState::WriteRegister
                } else {
                    SequencerState::Stop
                }
            }
            SequencerState::Read => {
                lines.release(Line::Data);
                let byte_end = self.bit == HIGH_BYTE_LSB || self.bit == 0;
                self.bit = self.bit.saturating_sub(1);
                if byte_end {
                    SequencerState::MasterAck
                } else {
                    SequencerState::Read
                }
            }
            SequencerState::MasterAck => {
                if self.bit == BYTE_MSB {
                    lines.drive_low(Line::Data);
                    SequencerState::Read
                } else {
                    lines.release(Line::Data);
                    SequencerState::Stop
                }
            }
            SequencerState::Stop => {
                lines.drive_low(Line::Data);
                SequencerState::EndTransaction
            }
            SequencerState::EndTransaction => {
                // Clock is high and undriven: this is the stop condition
                lines.release(Line::Data);
                self.finish();
                SequencerState::Ready
            }
        };

        #[cfg(feature = "defmt")]
        if next != self.state {
            defmt::trace!("{} -> {} (bit {})", self.state, next, self.bit);
        }

        self.state = next;
    }

    /// Put bit `self.bit` of `value` on the data line
    fn send_bit<L: LineDriver>(&self, lines: &mut L, value: u16) {
        if (value >> self.bit) & 1 == 1 {
            lines.release(Line::Data);
        } else {
            lines.drive_low(Line::Data);
        }
    }

    fn open_ack_window<L: LineDriver>(&mut self, lines: &mut L) {
        lines.release(Line::Data);
        self.ack_window = true;
    }

    fn shift_in(&mut self, bit: bool) {
        self.shift = (self.shift << 1) | bit as u16;
    }

    fn finish(&mut self) {
        if self.request.direction == Direction::Read {
            self.read_payload = self.shift;
        }
        self.busy = false;
        self.done = true;
        self.clock_engaged = false;
        self.bit = BYTE_MSB;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "transaction done, ack_failed={} payload={:#x}",
            self.ack_failed,
            self.read_payload
        );
    }
}
