//! Open-drain line abstractions
//!
//! A bus line can be pulled low or released. Nothing on the bus ever
//! drives a line high; a released line floats up through the pull-up.

/// Selects one of the two bus lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Serial data line
    Data,
    /// Serial clock line
    Clock,
}

/// Open-drain output side of a line
///
/// Implementations pull the physical (or simulated) line low, or let go
/// of it.
pub trait OpenDrainLine {
    /// Pull the line to logic low
    fn drive_low(&mut self);

    /// Stop driving the line (high impedance)
    fn release(&mut self);

    /// Check if this side is currently pulling the line low
    fn is_driven_low(&self) -> bool;

    /// Drive low when `low` is true, release otherwise
    fn set_driven_low(&mut self, low: bool) {
        if low {
            self.drive_low();
        } else {
            self.release();
        }
    }
}

/// Input side of a line
///
/// Reports the wire level, which is low whenever any party on the bus is
/// pulling it low.
pub trait LineSense {
    /// Check if the line reads high (logic 1)
    ///
    /// Takes `&mut self` because pin reads typically require mutable access.
    fn is_high(&mut self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Line that can both be driven and sensed
///
/// The data line needs both: the master drives address and payload bits,
/// then releases it and reads acknowledge and read-data bits.
pub trait IoLine: OpenDrainLine + LineSense {}

// Blanket implementation for types that implement both traits
impl<T: OpenDrainLine + LineSense> IoLine for T {}
