//! GPIO bus line
//!
//! Adapts an `embedded-hal` digital pin configured as open-drain output
//! with input buffer (as most MCU HALs provide for I2C-style buses) to the
//! line traits.
//!
//! With the pin in open-drain mode, setting it low pulls the line down and
//! setting it high releases it.

use embedded_hal::digital::{InputPin, OutputPin};
use wattwire_hal::{LineSense, OpenDrainLine};

/// Open-drain GPIO line
pub struct OpenDrainPin<P> {
    pin: P,
    /// Current drive state (true = pulling low)
    driven: bool,
}

impl<P: OutputPin + InputPin> OpenDrainPin<P> {
    /// Create a new line, releasing the pin
    ///
    /// # Arguments
    /// - `pin`: A pin already configured as open-drain
    pub fn new(pin: P) -> Self {
        let mut line = Self { pin, driven: true };
        line.release();
        line
    }

    /// Get the underlying pin back
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin + InputPin> OpenDrainLine for OpenDrainPin<P> {
    fn drive_low(&mut self) {
        self.driven = true;
        if self.pin.set_low().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("line drive failed");
        }
    }

    fn release(&mut self) {
        self.driven = false;
        if self.pin.set_high().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("line release failed");
        }
    }

    fn is_driven_low(&self) -> bool {
        self.driven
    }
}

impl<P: OutputPin + InputPin> LineSense for OpenDrainPin<P> {
    fn is_high(&mut self) -> bool {
        // A failed read looks like a released line
        self.pin.is_high().unwrap_or(true)
    }
}
