//! Clock-phase generator
//!
//! Divides the reference tick into a square wave at the bus frequency.
//! Each tick reports the pulse value together with the value one tick
//! earlier, so consumers detect edges by comparison instead of needing an
//! edge-triggered interrupt.
//!
//! ```text
//! counter:  0 1 2 3 0 1 2 3 0      (divisor = 4)
//! pulse:    ‾ ‾ _ _ ‾ ‾ _ _ ‾
//!               ^ falling ^ rising
//! ```

/// Direction of a detected pulse transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Pulse went from low to high
    Rising,
    /// Pulse went from high to low
    Falling,
}

/// Pulse snapshot for one reference tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPhase {
    /// Pulse value this tick
    pub current: bool,
    /// Pulse value on the previous tick
    pub previous: bool,
    /// Divider counter, in `[0, divisor)`
    pub counter: u32,
}

impl ClockPhase {
    /// Idle phase: line high, no edge
    pub const IDLE: Self = Self {
        current: true,
        previous: true,
        counter: 0,
    };

    /// Check for a low-to-high transition
    pub fn is_rising(&self) -> bool {
        !self.previous && self.current
    }

    /// Check for a high-to-low transition
    pub fn is_falling(&self) -> bool {
        self.previous && !self.current
    }

    /// Get the edge seen this tick, if any
    pub fn edge(&self) -> Option<Edge> {
        match (self.previous, self.current) {
            (false, true) => Some(Edge::Rising),
            (true, false) => Some(Edge::Falling),
            _ => None,
        }
    }
}

impl Default for ClockPhase {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Clock-phase generator
///
/// The divisor must be at least 2 for any edge to appear. This is a
/// configuration precondition and is not checked here; see
/// [`BusConfig::validate`](crate::config::BusConfig::validate).
#[derive(Debug, Clone)]
pub struct ClockPhaseGenerator {
    /// Reference ticks per bus clock period
    divisor: u32,
    /// Position within the current period
    counter: u32,
    /// Last reported phase
    phase: ClockPhase,
}

impl ClockPhaseGenerator {
    /// Create a generator with the given divisor
    ///
    /// Use [`BusConfig::divisor`](crate::config::BusConfig::divisor) to
    /// derive it from the reference and bus frequencies.
    pub const fn with_divisor(divisor: u32) -> Self {
        Self {
            divisor,
            counter: 0,
            phase: ClockPhase::IDLE,
        }
    }

    /// Reference ticks per bus clock period
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Number of ticks the pulse stays high each period
    pub fn high_ticks(&self) -> u32 {
        self.divisor / 2
    }

    /// Number of ticks the pulse stays low each period
    pub fn low_ticks(&self) -> u32 {
        self.divisor - self.divisor / 2
    }

    /// Last reported phase
    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// Return to the idle (disabled) phase
    pub fn reset(&mut self) {
        self.counter = 0;
        self.phase = ClockPhase::IDLE;
    }

    /// Advance by one reference tick
    ///
    /// # Arguments
    /// - `enable`: When false the counter is held at 0 and the pulse
    ///   reads high with no edge
    /// - `start`: Restart the period from the beginning of a high phase
    pub fn tick(&mut self, enable: bool, start: bool) -> ClockPhase {
        if !enable {
            self.reset();
            return self.phase;
        }

        let previous = self.phase.current;

        let current = if start || self.counter >= self.divisor.saturating_sub(1) {
            self.counter = 0;
            true
        } else {
            self.counter += 1;
            self.counter < self.divisor / 2
        };

        self.phase = ClockPhase {
            current,
            previous,
            counter: self.counter,
        };
        self.phase
    }
}
