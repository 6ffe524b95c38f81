//! Fuzz target: `PersistenceGateway` over an arbitrary EEPROM image
//!
//! Drives boot-time restore from whatever bytes are in flash, then a save,
//! and verifies:
//! - No panics for any image
//! - A level is restored only when the validity marker is present
//! - After `save`, `load` returns exactly the saved level
//!
//! cargo fuzz run fuzz_eeprom_image

#![no_main]

use edgenode::adapters::nvs::EepromStore;
use edgenode::app::persistence::PersistenceGateway;
use edgenode::config::{CONFIG_SENTINEL, EEPROM_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut image = [0xFF; EEPROM_SIZE];
    let n = data.len().min(EEPROM_SIZE);
    image[..n].copy_from_slice(&data[..n]);

    let mut gateway = PersistenceGateway::new(EepromStore::from_image(image));
    let (level, restored) = gateway.load_actuator();

    assert_eq!(restored, image[0] == CONFIG_SENTINEL);
    if !restored {
        assert!(!level, "no record must mean off");
    }

    gateway.save(!level).expect("in-memory commit");
    assert_eq!(gateway.load(), Some(!level));
});
