//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! AD1 is read through the ADC1 oneshot helper; IO1 and the status LED are
//! any two [`OutputPin`]s.  This is the only module in the system that
//! touches actual hardware.  On non-espidf targets the underlying helpers
//! are cfg-gated simulation stubs.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::hw_init::adc1_read;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<O, L> {
    adc_channel: u32,
    io1: O,
    led: L,
}

impl<O: OutputPin, L: OutputPin> HardwareAdapter<O, L> {
    pub fn new(adc_channel: u32, io1: O, led: L) -> Self {
        Self {
            adc_channel,
            io1,
            led,
        }
    }

    pub fn io1(&self) -> &O {
        &self.io1
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<O: OutputPin, L: OutputPin> SensorPort for HardwareAdapter<O, L> {
    fn read_analog(&mut self) -> u16 {
        adc1_read(self.adc_channel)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<O: OutputPin, L: OutputPin> ActuatorPort for HardwareAdapter<O, L> {
    fn set_output(&mut self, high: bool) {
        if let Err(e) = self.io1.set_state(PinState::from(high)) {
            warn!("IO1 write failed: {:?}", e);
        }
    }

    fn set_indicator(&mut self, on: bool) {
        if let Err(e) = self.led.set_state(PinState::from(on)) {
            warn!("LED write failed: {:?}", e);
        }
    }
}
