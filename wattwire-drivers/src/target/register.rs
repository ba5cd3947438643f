//! 16-bit register sensor model
//!
//! Cycle-level model of a current/power monitor with six 16-bit
//! registers, seen from the bus. It watches both lines every tick and only
//! ever touches the data line, and only right after a clock fall.
//!
//! Write transfer: address byte, register pointer, then optionally the
//! high and low payload bytes. The pointer is sticky: a read transfer
//! returns the register last selected, MSB first, until the master
//! answers a byte with a nack.

use wattwire_core::config::{CALIBRATION_REGISTER, CONFIGURATION_REGISTER, DEFAULT_TARGET_ADDRESS};

use crate::sim::{BusLevels, SimulatedBus};

/// Number of registers
pub const REGISTER_COUNT: usize = 6;

/// Configuration register value after power-on
pub const CONFIGURATION_RESET: u16 = 0x399F;

/// Word returned for pointers past the last register
const UNMAPPED: u16 = 0xFFFF;

/// Sensor registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Operating mode, ranges, ADC resolution
    Configuration = CONFIGURATION_REGISTER,
    /// Shunt voltage measurement
    ShuntVoltage = 0x01,
    /// Bus voltage measurement
    BusVoltage = 0x02,
    /// Calculated power
    Power = 0x03,
    /// Calculated current
    Current = 0x04,
    /// Full-scale range and LSB of current and power
    Calibration = CALIBRATION_REGISTER,
}

impl Register {
    /// Look up a register by pointer value
    pub fn from_pointer(pointer: u8) -> Option<Self> {
        match pointer {
            0x00 => Some(Register::Configuration),
            0x01 => Some(Register::ShuntVoltage),
            0x02 => Some(Register::BusVoltage),
            0x03 => Some(Register::Power),
            0x04 => Some(Register::Current),
            0x05 => Some(Register::Calibration),
            _ => None,
        }
    }

    /// Pointer value on the wire
    pub fn pointer(self) -> u8 {
        self as u8
    }

    /// Check if the master can write this register
    pub fn is_writable(self) -> bool {
        matches!(self, Register::Configuration | Register::Calibration)
    }
}

/// Which bytes the target acknowledges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckPolicy {
    /// Acknowledge the address and every written byte
    #[default]
    Always,
    /// Never acknowledge, as if nothing is at the address
    Never,
    /// Acknowledge the address byte only
    AddressOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Not addressed; waiting for a start condition
    Idle,
    /// Shifting in a byte from the master
    Receive,
    /// Ninth clock of a received byte
    Ack { pull: bool, transmit: bool },
    /// Shifting out a byte to the master
    Transmit,
    /// Ninth clock of a transmitted byte
    MasterAck,
}

/// Register sensor on the simulated bus
#[derive(Debug, Clone)]
pub struct RegisterTarget {
    address: u8,
    policy: AckPolicy,
    registers: [u16; REGISTER_COUNT],
    pointer: u8,
    phase: Phase,
    last: BusLevels,
    /// Data line pull applied on the bus
    pull: bool,
    /// Receive shift register and bit count
    shift: u8,
    bits: u8,
    /// Bytes received in the current transfer, address included
    received: u8,
    /// High byte of a payload being written
    payload_high: u8,
    /// Word being transmitted and the index of the bit on the line
    tx_word: u16,
    tx_bit: u8,
    master_acked: bool,
    /// Completed register writes
    writes: u32,
}

impl Default for RegisterTarget {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_ADDRESS)
    }
}

impl RegisterTarget {
    /// Create a target at `address` with power-on register values
    pub fn new(address: u8) -> Self {
        let mut registers = [0; REGISTER_COUNT];
        registers[Register::Configuration as usize] = CONFIGURATION_RESET;

        Self {
            address,
            policy: AckPolicy::Always,
            registers,
            pointer: 0,
            phase: Phase::Idle,
            last: BusLevels::IDLE,
            pull: false,
            shift: 0,
            bits: 0,
            received: 0,
            payload_high: 0,
            tx_word: 0,
            tx_bit: 0,
            master_acked: false,
            writes: 0,
        }
    }

    /// Use a different acknowledge policy
    pub fn with_policy(mut self, policy: AckPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Change the acknowledge policy
    pub fn set_policy(&mut self, policy: AckPolicy) {
        self.policy = policy;
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Current register pointer
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// Read a register directly
    pub fn register(&self, register: Register) -> u16 {
        self.registers[register as usize]
    }

    /// Set a register directly, e.g. to stage a measurement
    pub fn set_register(&mut self, register: Register, value: u16) {
        self.registers[register as usize] = value;
    }

    /// Number of register writes committed over the bus
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Check if the target is pulling the data line low
    pub fn is_pulling(&self) -> bool {
        self.pull
    }

    /// Advance by one reference tick
    ///
    /// Samples the bus, reacts to conditions and clock edges, and applies
    /// the resulting data pull.
    pub fn tick(&mut self, bus: &mut SimulatedBus) {
        let now = bus.levels();
        let last = self.last;
        self.last = now;

        if last.clock && now.clock && last.data != now.data {
            if !now.data {
                self.on_start();
            } else {
                self.phase = Phase::Idle;
                self.pull = false;
            }
        } else if !last.clock && now.clock {
            self.on_clock_rise(now.data);
        } else if last.clock && !now.clock {
            self.on_clock_fall();
        }

        bus.set_target_data(self.pull);
    }

    fn on_start(&mut self) {
        self.phase = Phase::Receive;
        self.pull = false;
        self.shift = 0;
        self.bits = 0;
        self.received = 0;
    }

    fn on_clock_rise(&mut self, data: bool) {
        match self.phase {
            Phase::Receive if self.bits < 8 => {
                self.shift = (self.shift << 1) | data as u8;
                self.bits += 1;
            }
            Phase::MasterAck => self.master_acked = !data,
            Phase::Idle
            | Phase::Receive
            | Phase::Ack { .. }
            | Phase::Transmit => {}
        }
    }

    fn on_clock_fall(&mut self) {
        match self.phase {
            Phase::Idle => {}
            Phase::Receive => {
                if self.bits == 8 {
                    let byte = self.shift;
                    self.shift = 0;
                    self.bits = 0;
                    self.phase = self.receive_byte(byte);
                    self.pull = matches!(self.phase, Phase::Ack { pull: true, .. });
                }
            }
            Phase::Ack { transmit, .. } => {
                if transmit {
                    self.tx_word = self.read_pointer();
                    self.tx_bit = 15;
                    self.phase = Phase::Transmit;
                    self.put_tx_bit();
                } else {
                    self.phase = Phase::Receive;
                    self.pull = false;
                }
            }
            Phase::Transmit => {
                if self.tx_bit == 8 || self.tx_bit == 0 {
                    self.phase = Phase::MasterAck;
                    self.pull = false;
                } else {
                    self.tx_bit -= 1;
                    self.put_tx_bit();
                }
            }
            Phase::MasterAck => {
                if self.master_acked && self.tx_bit == 8 {
                    self.tx_bit = 7;
                    self.phase = Phase::Transmit;
                    self.put_tx_bit();
                } else {
                    self.phase = Phase::Idle;
                    self.pull = false;
                }
            }
        }
    }

    /// Handle a complete received byte and pick the ack clock behavior
    fn receive_byte(&mut self, byte: u8) -> Phase {
        let index = self.received;
        self.received = self.received.saturating_add(1);

        if index == 0 {
            if byte >> 1 != self.address || self.policy == AckPolicy::Never {
                return Phase::Idle;
            }
            return Phase::Ack {
                pull: true,
                transmit: byte & 1 == 1,
            };
        }

        match index {
            1 => self.pointer = byte,
            2 => self.payload_high = byte,
            3 => self.write_pointer(u16::from_be_bytes([self.payload_high, byte])),
            _ => {}
        }

        Phase::Ack {
            pull: self.policy == AckPolicy::Always,
            transmit: false,
        }
    }

    fn read_pointer(&self) -> u16 {
        Register::from_pointer(self.pointer)
            .map(|r| self.registers[r as usize])
            .unwrap_or(UNMAPPED)
    }

    fn write_pointer(&mut self, value: u16) {
        if let Some(register) = Register::from_pointer(self.pointer).filter(|r| r.is_writable()) {
            self.registers[register as usize] = value;
            self.writes += 1;
        }
    }

    fn put_tx_bit(&mut self) {
        self.pull = (self.tx_word >> self.tx_bit) & 1 == 0;
    }
}
