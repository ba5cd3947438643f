//! Line-level bus monitor
//!
//! Watches `(data, clock)` samples and reports start conditions, stop
//! conditions and data bits.

/// Event seen on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusEvent {
    /// Data fell while the clock was high
    Start,
    /// Data rose while the clock was high
    Stop,
    /// One data bit (true = line high)
    Bit(bool),
}

/// Passive monitor for the two bus lines
///
/// A bit is latched at the clock rise but only reported at the next clock
/// fall. The clock rise ahead of a stop condition therefore never shows up
/// as a bit.
#[derive(Debug, Clone)]
pub struct BusMonitor {
    last_data: bool,
    last_clock: bool,
    latched: Option<bool>,
}

impl Default for BusMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl BusMonitor {
    /// Create a monitor for an idle bus (both lines high)
    pub fn new() -> Self {
        Self {
            last_data: true,
            last_clock: true,
            latched: None,
        }
    }

    /// Forget everything and assume an idle bus
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one sample of the line levels
    ///
    /// Returns the event completed by this sample, if any.
    pub fn observe(&mut self, data: bool, clock: bool) -> Option<BusEvent> {
        let clock_held_high = self.last_clock && clock;

        let event = if clock_held_high && self.last_data && !data {
            self.latched = None;
            Some(BusEvent::Start)
        } else if clock_held_high && !self.last_data && data {
            self.latched = None;
            Some(BusEvent::Stop)
        } else if !self.last_clock && clock {
            self.latched = Some(data);
            None
        } else if self.last_clock && !clock {
            self.latched.take().map(BusEvent::Bit)
        } else {
            None
        };

        self.last_data = data;
        self.last_clock = clock;
        event
    }
}
