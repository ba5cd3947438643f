//! Two-line bus abstractions
//!
//! [`LineDriver`] is the seam between the transaction sequencer and the
//! outside world. The sequencer only ever calls it from its edge handlers,
//! so ownership of each line is never ambiguous.

use crate::line::{IoLine, Line};

/// Driver for both bus lines
///
/// All operations are open-drain: `drive_low` pulls a line low, `release`
/// lets it float high. There is intentionally no "drive high".
pub trait LineDriver {
    /// Pull the selected line low
    fn drive_low(&mut self, line: Line);

    /// Release the selected line (high impedance)
    fn release(&mut self, line: Line);

    /// Read the wire level of the selected line
    ///
    /// Returns `true` if nobody on the bus is pulling the line low.
    fn is_high(&mut self, line: Line) -> bool;

    /// Read whether the selected line is low
    fn is_low(&mut self, line: Line) -> bool {
        !self.is_high(line)
    }

    /// Release both lines
    fn release_all(&mut self) {
        self.release(Line::Data);
        self.release(Line::Clock);
    }
}

/// Line driver built from two independent lines
///
/// # Arguments
/// - `D`: data line
/// - `C`: clock line
pub struct SplitLines<D, C> {
    data: D,
    clock: C,
}

impl<D: IoLine, C: IoLine> SplitLines<D, C> {
    /// Create a new driver from a data line and a clock line
    pub fn new(data: D, clock: C) -> Self {
        Self { data, clock }
    }

    /// Get access to the data line
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Get access to the clock line
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Split back into the individual lines
    pub fn into_inner(self) -> (D, C) {
        (self.data, self.clock)
    }
}

impl<D: IoLine, C: IoLine> LineDriver for SplitLines<D, C> {
    fn drive_low(&mut self, line: Line) {
        match line {
            Line::Data => self.data.drive_low(),
            Line::Clock => self.clock.drive_low(),
        }
    }

    fn release(&mut self, line: Line) {
        match line {
            Line::Data => self.data.release(),
            Line::Clock => self.clock.release(),
        }
    }

    fn is_high(&mut self, line: Line) -> bool {
        match line {
            Line::Data => self.data.is_high(),
            Line::Clock => self.clock.is_high(),
        }
    }
}

/// Bus clock frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusSpeed {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for BusSpeed {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BusSpeed {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };
}
