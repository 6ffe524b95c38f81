//! Random source for the per-attempt client id suffix.
//!
//! Hardware RNG on ESP-IDF (`esp_random`, fed by RF noise once WiFi is up).
//! On the host, a `RandomState`-keyed hasher over a counter.

use crate::app::ports::EntropyPort;

pub struct HwEntropy {
    #[cfg(not(target_os = "espidf"))]
    state: std::collections::hash_map::RandomState,
    #[cfg(not(target_os = "espidf"))]
    counter: u64,
}

impl Default for HwEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl HwEntropy {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            state: std::collections::hash_map::RandomState::new(),
            #[cfg(not(target_os = "espidf"))]
            counter: 0,
        }
    }
}

impl EntropyPort for HwEntropy {
    #[cfg(target_os = "espidf")]
    fn next_u16(&mut self) -> u16 {
        // SAFETY: esp_random has no preconditions.
        (unsafe { esp_idf_svc::sys::esp_random() }) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_u16(&mut self) -> u16 {
        use std::hash::BuildHasher;
        self.counter = self.counter.wrapping_add(1);
        self.state.hash_one(self.counter) as u16
    }
}
