//! Persistence gateway for the single durable setting (IO1 level).
//!
//! Layout in the byte store:
//!
//! | Offset | Content                           |
//! |--------|-----------------------------------|
//! | 0      | validity marker `0xAA`            |
//! | 1      | actuator level, `0` off, else on  |
//!
//! Without the marker the store holds no configuration and the actuator
//! defaults to off.  Saves are write-through: marker, value, commit.

use log::{info, warn};

use super::ports::ByteStore;
use crate::config::CONFIG_SENTINEL;
use crate::error::StorageError;

const MARKER_OFFSET: usize = 0;
const ACTUATOR_OFFSET: usize = 1;

pub struct PersistenceGateway<S: ByteStore> {
    store: S,
}

impl<S: ByteStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether a committed record exists.
    pub fn has_record(&self) -> bool {
        matches!(self.store.read(MARKER_OFFSET), Ok(CONFIG_SENTINEL))
    }

    /// Stored actuator level, or `None` when there is no valid record.
    pub fn load(&self) -> Option<bool> {
        if !self.has_record() {
            return None;
        }
        match self.store.read(ACTUATOR_OFFSET) {
            Ok(b) => Some(b != 0),
            Err(e) => {
                warn!("persistence: read failed: {}", e);
                None
            }
        }
    }

    /// Stored level, falling back to off.  Returns `(level, restored)`.
    pub fn load_actuator(&self) -> (bool, bool) {
        match self.load() {
            Some(level) => {
                info!("persistence: loaded io1={}", level);
                (level, true)
            }
            None => {
                info!("persistence: no saved configuration, using defaults");
                (false, false)
            }
        }
    }

    pub fn save(&mut self, level: bool) -> Result<(), StorageError> {
        self.store.write(MARKER_OFFSET, CONFIG_SENTINEL)?;
        self.store.write(ACTUATOR_OFFSET, u8::from(level))?;
        self.store.commit()
    }
}
