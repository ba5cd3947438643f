//! Simulated two-line bus
//!
//! Two open-drain lines shared by a master and a target. Each participant
//! independently pulls a line low or lets go of it; a line reads high only
//! when nobody pulls it low, as with a real pull-up.

use wattwire_hal::{Line, LineDriver};

/// Pull index of the master
const MASTER: usize = 0;

/// Pull index of the target
const TARGET: usize = 1;

/// Wire levels of both lines (true = high)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusLevels {
    /// Data line level
    pub data: bool,
    /// Clock line level
    pub clock: bool,
}

impl BusLevels {
    /// Both lines released
    pub const IDLE: Self = Self {
        data: true,
        clock: true,
    };
}

/// Wired-AND bus with one master and one target
///
/// Implements [`LineDriver`] for the master side. The target side is
/// driven through [`set_target_data`](Self::set_target_data) and
/// [`set_target_clock`](Self::set_target_clock).
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    /// Data pull-down: [master, target]. true = pulling low.
    data_pulls: [bool; 2],
    /// Clock pull-down: [master, target].
    clock_pulls: [bool; 2],
}

impl SimulatedBus {
    /// Create a bus with both lines released
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the target pulls the data line low
    pub fn set_target_data(&mut self, pull_low: bool) {
        self.data_pulls[TARGET] = pull_low;
    }

    /// Set whether the target holds the clock line low
    pub fn set_target_clock(&mut self, pull_low: bool) {
        self.clock_pulls[TARGET] = pull_low;
    }

    /// Check if the master is pulling a line low
    pub fn master_drives(&self, line: Line) -> bool {
        match line {
            Line::Data => self.data_pulls[MASTER],
            Line::Clock => self.clock_pulls[MASTER],
        }
    }

    /// Check if the target is pulling the data line low
    pub fn target_drives_data(&self) -> bool {
        self.data_pulls[TARGET]
    }

    /// Data line level. High when nobody pulls it low.
    pub fn data(&self) -> bool {
        !self.data_pulls[MASTER] && !self.data_pulls[TARGET]
    }

    /// Clock line level. High when nobody pulls it low.
    pub fn clock(&self) -> bool {
        !self.clock_pulls[MASTER] && !self.clock_pulls[TARGET]
    }

    /// Levels of both lines
    pub fn levels(&self) -> BusLevels {
        BusLevels {
            data: self.data(),
            clock: self.clock(),
        }
    }
}

impl LineDriver for SimulatedBus {
    fn drive_low(&mut self, line: Line) {
        match line {
            Line::Data => self.data_pulls[MASTER] = true,
            Line::Clock => self.clock_pulls[MASTER] = true,
        }
    }

    fn release(&mut self, line: Line) {
        match line {
            Line::Data => self.data_pulls[MASTER] = false,
            Line::Clock => self.clock_pulls[MASTER] = false,
        }
    }

    fn is_high(&mut self, line: Line) -> bool {
        match line {
            Line::Data => self.data(),
            Line::Clock => self.clock(),
        }
    }
}
