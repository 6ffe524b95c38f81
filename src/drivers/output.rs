//! Digital output line over the raw GPIO helpers.
//!
//! Implements [`embedded_hal::digital::OutputPin`] so the hardware adapter
//! can be generic over the pin type.  Two `GpioOutput`s may name the same
//! GPIO (IO1 and the LED share GPIO2 on the reference board), which an
//! owning `PinDriver` would not allow.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use super::hw_init::gpio_write;

pub struct GpioOutput {
    pin: i32,
    high: bool,
}

impl GpioOutput {
    /// Wrap an already-configured output pin.  The line is assumed low.
    pub fn new(pin: i32) -> Self {
        Self { pin, high: false }
    }

    /// Level last written through this handle.
    pub fn is_set_high(&self) -> bool {
        self.high
    }

    fn write(&mut self, high: bool) {
        gpio_write(self.pin, high);
        self.high = high;
    }
}

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}
