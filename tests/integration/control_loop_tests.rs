//! Integration tests for the ControlLoop → link/session → telemetry pipeline.
//!
//! Every test drives the loop tick by tick against the simulated board and
//! asserts on what reached the broker, the GPIO lines and the event sink.

use crate::mock_hw::{HwCall, Rig, transitions};

use edgenode::app::events::AppEvent;
use edgenode::app::health::DeviceHealth;
use edgenode::app::ports::BrokerPort;
use edgenode::config::{TOPIC_CONTROL, TOPIC_MEASUREMENT, TOPIC_STATUS};
use edgenode::connectivity::Status;
use edgenode::error::{LinkError, SessionError};

fn operational() -> Rig {
    let mut rig = Rig::new();
    rig.boot();
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    rig.p.sink.clear();
    rig
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn cold_boot_with_network_goes_operational() {
    let mut rig = Rig::new();
    rig.boot();

    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    assert_eq!(rig.control.health(), DeviceHealth::Operational);
    assert_eq!(rig.p.hw.calls.first(), Some(&HwCall::Output(false)));

    let events = &rig.p.sink.events;
    assert_eq!(
        events[0],
        AppEvent::Booted {
            actuator: false,
            restored: false
        }
    );
    assert_eq!(events[1], AppEvent::LinkUp);
    assert!(matches!(
        &events[2],
        AppEvent::SessionUp { client_id } if client_id.as_str() == "ESP32_Device-1"
    ));

    assert_eq!(rig.p.broker.sim_subscriptions(), [TOPIC_CONTROL.to_owned()]);

    let status = rig.published_json(TOPIC_STATUS);
    assert_eq!(status.len(), 1);
    assert_eq!(status[0]["status"], "online");
    assert_eq!(status[0]["device_id"], "ESP32_Device");
    assert_eq!(status[0]["ip"], "192.168.1.77");
    assert_eq!(status[0]["wifi_rssi"], -55);
    assert_eq!(status[0]["io1_state"], false);

    // Boot attempts are not reconnects.
    let counters = rig.control.context().counters;
    assert_eq!(counters.link_reconnects, 0);
    assert_eq!(counters.session_reconnects, 0);
    assert_eq!(counters.status_published, 1);
}

#[test]
fn boot_without_network_gives_up_after_bounded_pass() {
    let mut rig = Rig::new();
    rig.p.link.sim_set_ap_in_range(false);
    rig.boot();

    assert_eq!(rig.p.link.sim_attempts(), 20);
    assert_eq!(rig.p.clock.slept_ms(), 19 * 500);
    assert_eq!(rig.now(), 9_500);

    assert_eq!(rig.control.statuses(), (Status::Down, Status::Down));
    assert_eq!(rig.control.health(), DeviceHealth::Disconnected);
    assert!(rig.p.broker.sim_client_ids().is_empty());
    assert_eq!(
        rig.p.sink.count(|e| *e == AppEvent::LinkDown(LinkError::Timeout)),
        1
    );

    let link = rig.control.link_state();
    assert_eq!(link.retry_count, 20);
    assert_eq!(link.last_attempt_ms, Some(9_500));
}

// ── Reconnect pacing ──────────────────────────────────────────

#[test]
fn link_retry_waits_for_interval() {
    let mut rig = Rig::new();
    rig.p.link.sim_set_ap_in_range(false);
    rig.boot();

    rig.run_until(14_400);
    assert_eq!(rig.p.link.sim_attempts(), 20);
    assert_eq!(rig.control.context().counters.link_reconnects, 0);

    rig.tick_at(14_500);
    assert_eq!(rig.p.link.sim_attempts(), 21);
    assert_eq!(rig.control.context().counters.link_reconnects, 1);
    assert_eq!(rig.control.link_state().retry_count, 21);
}

#[test]
fn restored_link_brings_session_up_on_next_tick() {
    let mut rig = Rig::new();
    rig.p.link.sim_set_ap_in_range(false);
    rig.boot();
    rig.p.link.sim_set_ap_in_range(true);
    rig.p.sink.clear();

    rig.tick_at(14_500);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Down));
    assert_eq!(rig.control.health(), DeviceHealth::LinkOnly);
    assert!(rig.p.broker.sim_client_ids().is_empty());

    rig.tick_at(14_600);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    assert_eq!(rig.control.health(), DeviceHealth::Operational);

    let counters = rig.control.context().counters;
    assert_eq!(counters.link_reconnects, 1);
    assert_eq!(counters.session_reconnects, 1);

    let sink = &rig.p.sink;
    assert_eq!(sink.events[0], AppEvent::LinkUp);
    assert!(sink.events.contains(&AppEvent::HealthChanged {
        from: DeviceHealth::Disconnected,
        to: DeviceHealth::LinkOnly,
    }));
    assert!(sink.events.contains(&AppEvent::HealthChanged {
        from: DeviceHealth::LinkOnly,
        to: DeviceHealth::Operational,
    }));
    assert_eq!(rig.published_json(TOPIC_STATUS)[0]["status"], "online");
}

#[test]
fn link_loss_tears_session_down_first() {
    let mut rig = operational();
    rig.p.link.sim_set_ap_in_range(false);

    rig.tick_at(100);
    assert_eq!(rig.control.statuses(), (Status::Down, Status::Down));
    assert_eq!(rig.control.health(), DeviceHealth::Disconnected);

    let sink = &rig.p.sink;
    let session_down = sink
        .position(|e| *e == AppEvent::SessionDown(SessionError::LinkDown))
        .expect("session down reported");
    let link_down = sink
        .position(|e| *e == AppEvent::LinkDown(LinkError::Dropped))
        .expect("link down reported");
    assert!(session_down < link_down);
    assert!(rig.control.session_state().subscriptions.is_empty());
}

#[test]
fn recovers_after_link_loss() {
    let mut rig = operational();
    rig.p.link.sim_set_ap_in_range(false);
    rig.tick_at(100);
    rig.p.link.sim_set_ap_in_range(true);

    // Boot attempt at t=0 still gates the first retry.
    rig.run_until(4_900);
    assert_eq!(rig.control.statuses(), (Status::Down, Status::Down));

    rig.tick_at(5_000);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Down));
    rig.tick_at(5_100);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    assert_eq!(
        rig.p.broker.sim_client_ids().last().map(String::as_str),
        Some("ESP32_Device-2")
    );
}

#[test]
fn session_drop_is_detected_and_retried() {
    let mut rig = operational();
    rig.p.broker.sim_drop_session();

    rig.tick_at(100);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Down));
    assert_eq!(rig.control.health(), DeviceHealth::LinkOnly);
    assert_eq!(
        rig.p.sink.count(|e| *e == AppEvent::SessionDown(SessionError::Dropped)),
        1
    );

    rig.run_until(4_900);
    assert_eq!(rig.p.broker.sim_client_ids().len(), 1);

    rig.tick_at(5_000);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    assert_eq!(rig.p.broker.sim_client_ids()[1], "ESP32_Device-2");
    assert_eq!(rig.control.context().counters.session_reconnects, 1);
}

#[test]
fn command_queued_before_a_drop_is_still_applied() {
    let mut rig = operational();
    assert!(rig.deliver(r#"{"state":true}"#));
    rig.p.broker.sim_drop_session();

    rig.tick_at(100);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Down));
    assert!(rig.control.context().actuator.value);
    assert_eq!(rig.p.hw.last_output(), Some(true));
    assert_eq!(rig.p.persistence.store().committed_image()[1], 1);
    assert_eq!(rig.control.context().counters.messages_received, 1);

    // The confirmation cannot go out on the dropped session.
    assert!(rig.published_json(TOPIC_CONTROL).is_empty());
    let sink = &rig.p.sink;
    let applied = sink
        .position(|e| *e == AppEvent::ActuatorChanged(true))
        .expect("command applied");
    let dropped = sink
        .position(|e| *e == AppEvent::SessionDown(SessionError::Dropped))
        .expect("drop reported");
    assert!(applied < dropped);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::PublishFailed { topic, .. } if topic.as_str() == TOPIC_CONTROL)),
        1
    );

    rig.run_until(10_000);
    assert_eq!(rig.control.statuses(), (Status::Up, Status::Up));
    assert!(rig.control.context().actuator.value);
}

#[test]
fn failed_subscribe_keeps_session_down() {
    let mut rig = Rig::new();
    rig.p.broker.sim_reject_subscribe(true);
    rig.boot();

    assert_eq!(rig.control.statuses(), (Status::Up, Status::Down));
    assert!(!rig.p.broker.is_connected());
    assert_eq!(
        rig.p
            .sink
            .count(|e| *e == AppEvent::SessionDown(SessionError::SubscribeFailed)),
        1
    );
    assert!(rig.published_json(TOPIC_STATUS).is_empty());
}

// ── Telemetry schedule ────────────────────────────────────────

#[test]
fn measurement_at_most_once_per_interval() {
    let mut rig = operational();
    rig.p.hw.analog = 1234;

    rig.run_until(20_000);
    let samples = rig.published_json(TOPIC_MEASUREMENT);
    assert_eq!(samples.len(), 4);
    assert_eq!(rig.p.hw.reads, 4);
    assert_eq!(rig.control.context().counters.telemetry_published, 4);

    let first = &samples[0];
    assert_eq!(first["channel"], "AD1");
    assert_eq!(first["value"], 1234);
    assert_eq!(first["unit"], "ADC");
    assert_eq!(first["timestamp"], 5_000);
    assert_eq!(first["uptime"], 5);
    assert_eq!(first["io1_state"], false);
}

#[test]
fn periodic_status_reports_running() {
    let mut rig = operational();
    rig.run_until(30_000);

    let status = rig.published_json(TOPIC_STATUS);
    assert_eq!(status.len(), 2);
    assert_eq!(status[0]["status"], "online");
    assert_eq!(status[1]["status"], "running");
    assert_eq!(status[1]["uptime"], 30);
    assert_eq!(rig.control.context().counters.status_published, 2);
}

#[test]
fn nothing_published_while_session_down() {
    let mut rig = Rig::new();
    rig.p.broker.sim_set_reachable(false);
    rig.boot();

    rig.run_until(30_000);
    assert!(rig.p.broker.sim_published().is_empty());
    assert_eq!(rig.p.hw.reads, 0);
    assert_eq!(rig.control.context().counters.telemetry_published, 0);
}

// ── Indicator ─────────────────────────────────────────────────

#[test]
fn indicator_steady_when_operational() {
    let mut rig = operational();
    rig.run_until(1_000);

    let levels = rig.p.hw.indicators();
    assert_eq!(levels.len(), 10);
    assert!(levels.iter().all(|&on| on));
}

#[test]
fn indicator_slow_blinks_with_link_only() {
    let mut rig = operational();
    rig.p.broker.sim_set_reachable(false);

    rig.run_until(4_900);
    assert_eq!(rig.control.health(), DeviceHealth::LinkOnly);
    let levels = rig.p.hw.indicators();
    assert_eq!(levels.len(), 49);
    assert_eq!(transitions(&levels), 4);
}

#[test]
fn indicator_fast_blinks_when_disconnected() {
    let mut rig = Rig::new();
    rig.p.link.sim_set_ap_in_range(false);
    rig.boot();

    rig.run_until(10_500);
    let levels = rig.p.hw.indicators();
    assert_eq!(levels.len(), 10);
    assert_eq!(transitions(&levels), 4);
}
