//! Integration tests for IO1 persistence across simulated restarts.

use crate::mock_hw::{HwCall, Rig};

use edgenode::adapters::nvs::EepromStore;
use edgenode::app::events::AppEvent;
use edgenode::config::{CONFIG_SENTINEL, EEPROM_SIZE, TOPIC_STATUS};

fn blank_image() -> [u8; EEPROM_SIZE] {
    [0xFF; EEPROM_SIZE]
}

fn restart(image: [u8; EEPROM_SIZE]) -> Rig {
    let mut rig = Rig::with_store(EepromStore::from_image(image));
    rig.boot();
    rig
}

#[test]
fn fresh_device_boots_off() {
    let rig = restart(blank_image());

    assert!(!rig.control.context().actuator.value);
    assert_eq!(rig.p.hw.calls.first(), Some(&HwCall::Output(false)));
    assert_eq!(
        rig.p.sink.events[0],
        AppEvent::Booted {
            actuator: false,
            restored: false
        }
    );
    // Nothing is written until a command changes IO1.
    assert!(!rig.p.persistence.has_record());
}

#[test]
fn commanded_level_survives_restart() {
    let mut rig = Rig::new();
    rig.boot();
    rig.deliver(r#"{"state":true}"#);
    rig.tick_at(100);
    let image = rig.p.persistence.store().committed_image();

    let rebooted = restart(image);
    assert!(rebooted.control.context().actuator.value);
    assert_eq!(rebooted.p.hw.calls.first(), Some(&HwCall::Output(true)));
    assert_eq!(
        rebooted.p.sink.events[0],
        AppEvent::Booted {
            actuator: true,
            restored: true
        }
    );

    let status = rebooted.published_json(TOPIC_STATUS);
    assert_eq!(status[0]["io1_state"], true);
}

#[test]
fn value_without_marker_is_ignored() {
    let mut image = blank_image();
    image[1] = 1;

    let rig = restart(image);
    assert!(!rig.control.context().actuator.value);
}

#[test]
fn any_nonzero_value_byte_means_on() {
    let mut image = blank_image();
    image[0] = CONFIG_SENTINEL;
    image[1] = 0x07;

    let rig = restart(image);
    assert!(rig.control.context().actuator.value);
}

#[test]
fn marker_with_zero_restores_off() {
    let mut image = blank_image();
    image[0] = CONFIG_SENTINEL;
    image[1] = 0;

    let rig = restart(image);
    assert!(!rig.control.context().actuator.value);
    assert_eq!(
        rig.p.sink.events[0],
        AppEvent::Booted {
            actuator: false,
            restored: true
        }
    );
}

#[test]
fn restored_level_applies_without_network() {
    let mut image = blank_image();
    image[0] = CONFIG_SENTINEL;
    image[1] = 1;

    let mut rig = Rig::with_store(EepromStore::from_image(image));
    rig.p.link.sim_set_ap_in_range(false);
    rig.boot();

    assert_eq!(rig.p.hw.calls.first(), Some(&HwCall::Output(true)));
    assert!(rig.control.context().actuator.value);
}
