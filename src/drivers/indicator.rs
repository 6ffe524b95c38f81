//! Status indicator driver.
//!
//! Maps [`DeviceHealth`] to a single on/off line:
//!
//! | Health        | Mode       | Period  |
//! |---------------|------------|---------|
//! | Operational   | Steady on  | n/a     |
//! | LinkOnly      | Slow blink | 1000 ms |
//! | Disconnected  | Fast blink | 200 ms  |
//!
//! The only state is the current phase and the last toggle time.  A mode
//! change never forces a toggle; it only changes the cadence from then on.

use crate::app::health::DeviceHealth;
use crate::config::DeviceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    SteadyOn,
    SlowBlink,
    FastBlink,
}

impl From<DeviceHealth> for IndicatorMode {
    fn from(health: DeviceHealth) -> Self {
        match health {
            DeviceHealth::Operational => Self::SteadyOn,
            DeviceHealth::LinkOnly => Self::SlowBlink,
            DeviceHealth::Disconnected => Self::FastBlink,
        }
    }
}

pub struct IndicatorDriver {
    fast_ms: u32,
    slow_ms: u32,
    lit: bool,
    last_toggle_ms: u64,
}

impl IndicatorDriver {
    pub fn new(fast_ms: u32, slow_ms: u32) -> Self {
        Self {
            fast_ms,
            slow_ms,
            lit: false,
            last_toggle_ms: 0,
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        Self::new(config.fast_blink_ms, config.slow_blink_ms)
    }

    /// Advance the pattern and return the level to drive.
    pub fn update(&mut self, now_ms: u64, health: DeviceHealth) -> bool {
        let period = match IndicatorMode::from(health) {
            IndicatorMode::SteadyOn => {
                self.lit = true;
                return true;
            }
            IndicatorMode::SlowBlink => self.slow_ms,
            IndicatorMode::FastBlink => self.fast_ms,
        };

        if now_ms.saturating_sub(self.last_toggle_ms) >= u64::from(period) {
            self.lit = !self.lit;
            self.last_toggle_ms = now_ms;
        }
        self.lit
    }

    /// Force the phase, e.g. to mirror the actuator after a command.
    pub fn mirror(&mut self, on: bool) {
        self.lit = on;
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}
