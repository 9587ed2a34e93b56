//! End-to-end scenarios against the mock transport, store and control sinks

use embassy_futures::block_on;

use mqtt_params::control::MockControl;
use mqtt_params::mqtt::MockMqtt;
use mqtt_params::notify::{EntryInfo, Notifier, NullNotifier};
use mqtt_params::params::{EventChannel, ParamEvent, ParamHandler};
use mqtt_params::storage::MockStore;
use mqtt_params::{
    ChangeMode, ParamCell, ParamRegistry, ParamType, ParamValue, RegisterRequest, RegistryConfig,
};

// Host linking: std critical-section impl and the std time driver
use critical_section as _;
use embassy_time as _;

type TestRegistry<N> = ParamRegistry<MockMqtt, MockStore, MockControl, N>;

fn config() -> RegistryConfig {
    RegistryConfig {
        device: "boiler",
        location: "home",
        ..RegistryConfig::default()
    }
}

/// Confirmations land on the subscribe topic itself, like a broker that
/// re-publishes accepted values back to the device
fn echoing_config() -> RegistryConfig {
    RegistryConfig {
        confirm_root: "params",
        ..config()
    }
}

fn registry<N: Notifier>(cfg: RegistryConfig, notifier: N) -> TestRegistry<N> {
    ParamRegistry::new(cfg, MockMqtt::new(), MockStore::new(), MockControl::new(), notifier)
}

#[derive(Default)]
struct RecordingNotifier {
    changed: Vec<(String, String, String)>,
    restored: Vec<(String, String)>,
    out_of_range: Vec<String>,
    equal: u32,
}

impl Notifier for RecordingNotifier {
    fn changed(&mut self, entry: EntryInfo<'_>, old: &str, new: &str) {
        self.changed
            .push((entry.key.to_string(), old.to_string(), new.to_string()));
    }

    fn equal(&mut self, _entry: EntryInfo<'_>) {
        self.equal += 1;
    }

    fn out_of_range(&mut self, _entry: EntryInfo<'_>, payload: &str) {
        self.out_of_range.push(payload.to_string());
    }

    fn restored(&mut self, entry: EntryInfo<'_>, value: &str) {
        self.restored.push((entry.key.to_string(), value.to_string()));
    }
}

#[test]
fn test_parameter_lifecycle() {
    static THRESHOLD: ParamCell = ParamCell::new(ParamValue::I32(10));
    let mut reg = registry(echoing_config(), RecordingNotifier::default());

    let sensor = reg.group(None, "sensor", "sensor", "Sensors").unwrap();
    let id = reg
        .register(RegisterRequest::parameter(
            ParamType::I32,
            Some(sensor),
            "threshold",
            "Threshold",
            &THRESHOLD,
        ))
        .unwrap();
    reg.set_limits(id, ParamValue::I32(0), ParamValue::I32(100))
        .unwrap();

    // Nothing on the wire while disconnected
    assert!(reg.mqtt().publishes().is_empty());

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();

    let topic = "params/home/boiler/sensor/threshold";
    assert_eq!(reg.mqtt().subscribes().len(), 1);
    assert_eq!(reg.mqtt().subscribes()[0].as_str(), topic);
    // Startup confirmation carries the current value, retained
    let startup = &reg.mqtt().publishes()[0];
    assert_eq!(startup.topic.as_str(), topic);
    assert_eq!(startup.payload.as_ref().unwrap().as_str(), "10");
    assert!(startup.retained);

    // Accepted update: cell, store and confirmation all move to 15
    reg.mqtt_mut().clear_recordings();
    reg.on_incoming_message(topic, "15");
    assert_eq!(THRESHOLD.get(), ParamValue::I32(15));
    assert_eq!(
        reg.store().stored("sensor", "threshold"),
        Some(&ParamValue::I32(15))
    );
    let confirm = reg.mqtt().last_publish().unwrap();
    assert_eq!(confirm.payload.as_ref().unwrap().as_str(), "15");
    assert!(reg.entry(id).unwrap().locked());

    // The confirmation comes back from the broker and is swallowed once
    let writes_before = reg.store().write_count();
    reg.mqtt_mut().clear_recordings();
    reg.on_incoming_message(topic, "15");
    assert!(!reg.entry(id).unwrap().locked());
    assert!(reg.mqtt().publishes().is_empty());
    assert_eq!(reg.store().write_count(), writes_before);
    assert_eq!(THRESHOLD.get(), ParamValue::I32(15));

    // Out of range: rejected, current value pushed back out
    reg.on_incoming_message(topic, "999");
    assert_eq!(THRESHOLD.get(), ParamValue::I32(15));
    let republish = reg.mqtt().last_publish().unwrap();
    assert_eq!(republish.payload.as_ref().unwrap().as_str(), "15");
    assert_eq!(reg.notifier().out_of_range, vec!["999".to_string()]);

    // Swallow the republish echo, then a second genuine update lands
    reg.on_incoming_message(topic, "15");
    reg.on_incoming_message(topic, "20");
    assert_eq!(THRESHOLD.get(), ParamValue::I32(20));

    // Equal value from outside: ignored, no wire traffic
    reg.on_incoming_message(topic, "20"); // echo
    reg.mqtt_mut().clear_recordings();
    reg.on_incoming_message(topic, "20");
    assert!(reg.mqtt().publishes().is_empty());
    assert_eq!(reg.notifier().equal, 1);

    assert_eq!(
        reg.notifier().changed,
        vec![
            ("threshold".to_string(), "10".to_string(), "15".to_string()),
            ("threshold".to_string(), "15".to_string(), "20".to_string()),
        ]
    );
}

#[test]
fn test_garbage_payload_leaves_state_untouched() {
    static RATE: ParamCell = ParamCell::new(ParamValue::F32(0.5));
    let mut reg = registry(config(), RecordingNotifier::default());
    let id = reg
        .register(RegisterRequest::parameter(
            ParamType::F32,
            None,
            "rate",
            "Rate",
            &RATE,
        ))
        .unwrap();

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();
    reg.mqtt_mut().clear_recordings();

    reg.on_incoming_message("params/home/boiler/rate", "not-a-number");
    assert_eq!(RATE.get(), ParamValue::F32(0.5));
    assert!(reg.mqtt().publishes().is_empty());
    assert_eq!(reg.store().write_count(), 0);
    assert!(!reg.entry(id).unwrap().locked());
}

#[test]
fn test_disconnect_teardown_and_reprovision() {
    static A: ParamCell = ParamCell::new(ParamValue::Bool(true));
    static B: ParamCell = ParamCell::new(ParamValue::U32(3));
    let mut reg = registry(config(), NullNotifier);
    let a = reg
        .register(RegisterRequest::parameter(ParamType::Bool, None, "a", "A", &A))
        .unwrap();
    let b = reg
        .register(RegisterRequest::parameter(ParamType::U32, None, "b", "B", &B))
        .unwrap();

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();
    assert_eq!(reg.mqtt().subscribes().len(), 2);
    assert_eq!(reg.mqtt().publishes().len(), 2);

    reg.close_subscriptions();
    assert_eq!(reg.mqtt().unsubscribes().len(), 2);
    for id in [a, b] {
        let entry = reg.entry(id).unwrap();
        assert!(!entry.subscribed());
        assert!(!entry.provisioned());
        assert!(entry.confirm.is_none());
    }

    // Reconnect: everything is rebuilt from scratch
    reg.mqtt_mut().clear_recordings();
    block_on(reg.open_subscriptions(true, false)).unwrap();
    assert_eq!(reg.mqtt().subscribes().len(), 2);
    assert_eq!(reg.mqtt().publishes().len(), 2);
    assert!(reg.entry(a).unwrap().subscribed());
}

#[test]
fn test_connection_lost_mid_subscribe() {
    static A: ParamCell = ParamCell::new(ParamValue::I32(1));
    static B: ParamCell = ParamCell::new(ParamValue::I32(2));
    static C: ParamCell = ParamCell::new(ParamValue::I32(3));
    let mut reg = registry(config(), NullNotifier);
    let mut ids = Vec::new();
    for (key, cell) in [("a", &A), ("b", &B), ("c", &C)] {
        ids.push(
            reg.register(RegisterRequest::parameter(ParamType::I32, None, key, key, cell))
                .unwrap(),
        );
    }

    reg.mqtt_mut().set_connected(true);
    reg.mqtt_mut().drop_after_subscribes(2);
    let result = block_on(reg.open_subscriptions(true, false));

    assert!(result.is_err());
    assert!(reg.mqtt().restart_requested());
    // Partial state was torn down, nothing left half-provisioned
    for id in ids {
        let entry = reg.entry(id).unwrap();
        assert!(!entry.subscribed());
        assert!(!entry.provisioned());
    }
}

#[test]
fn test_ota_dispatch_and_retained_clear() {
    let mut reg = registry(config(), NullNotifier);
    reg.register_system_entries().unwrap();
    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();
    reg.mqtt_mut().clear_recordings();

    let topic = "system/home/boiler/ota";

    // Retained replay of a cleared topic: ignored
    reg.on_incoming_message(topic, "");
    assert!(reg.control().ota_urls().is_empty());
    assert!(reg.mqtt().publishes().is_empty());

    reg.on_incoming_message(topic, "https://example.com/fw.bin");
    assert_eq!(reg.control().ota_urls().len(), 1);
    assert_eq!(reg.control().ota_urls()[0].as_str(), "https://example.com/fw.bin");
    // Reset sequence: unsubscribe, clear retained payload, resubscribe
    assert_eq!(reg.mqtt().unsubscribes().len(), 1);
    assert_eq!(reg.mqtt().unsubscribes()[0].as_str(), topic);
    let clear = reg.mqtt().last_publish().unwrap();
    assert_eq!(clear.topic.as_str(), topic);
    assert_eq!(clear.payload, None);
    assert!(clear.retained);
    assert_eq!(reg.mqtt().subscribes().len(), 1);
}

#[test]
fn test_command_dispatch() {
    let mut reg = registry(config(), NullNotifier);
    reg.register_system_entries().unwrap();
    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();

    let topic = "system/home/boiler/command";

    reg.on_incoming_message(topic, "restart");
    assert_eq!(reg.control().restarts(), 1);
    assert!(reg.control().commands().is_empty());

    reg.on_incoming_message(topic, "calibrate");
    assert_eq!(reg.control().commands().len(), 1);
    assert_eq!(reg.control().commands()[0].as_str(), "calibrate");

    reg.on_incoming_message(topic, "");
    assert_eq!(reg.control().restarts(), 1);
    assert_eq!(reg.control().commands().len(), 1);
}

#[test]
fn test_backlog_poll_is_bounded() {
    static A: ParamCell = ParamCell::new(ParamValue::I32(1));
    static B: ParamCell = ParamCell::new(ParamValue::I32(2));
    let mut reg = registry(config(), NullNotifier);
    reg.register(RegisterRequest::parameter(ParamType::I32, None, "a", "A", &A))
        .unwrap();
    reg.register(RegisterRequest::parameter(ParamType::I32, None, "b", "B", &B))
        .unwrap();

    reg.mqtt_mut().set_connected(true);
    // Outbox stuck above the threshold: the drain poll must give up after
    // its bounded number of iterations instead of hanging the open
    reg.mqtt_mut().set_outbox_depth(10);
    block_on(reg.open_subscriptions(true, false)).unwrap();

    assert_eq!(reg.mqtt().subscribes().len(), 2);
    assert_eq!(reg.mqtt().publishes().len(), 2);
}

#[test]
fn test_force_and_role_change_resubscribe() {
    static A: ParamCell = ParamCell::new(ParamValue::I32(1));
    static B: ParamCell = ParamCell::new(ParamValue::I32(2));
    let mut reg = registry(config(), NullNotifier);
    reg.register(RegisterRequest::parameter(ParamType::I32, None, "a", "A", &A))
        .unwrap();
    reg.register(RegisterRequest::parameter(ParamType::I32, None, "b", "B", &B))
        .unwrap();

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();
    reg.mqtt_mut().clear_recordings();

    // Same role, not forced: already provisioned, nothing touches the wire
    block_on(reg.open_subscriptions(true, false)).unwrap();
    assert!(reg.mqtt().subscribes().is_empty());
    assert!(reg.mqtt().unsubscribes().is_empty());
    assert!(reg.mqtt().publishes().is_empty());

    // Broker role flips: tear down and rebuild exactly once
    block_on(reg.open_subscriptions(false, false)).unwrap();
    assert_eq!(reg.mqtt().unsubscribes().len(), 2);
    assert_eq!(reg.mqtt().subscribes().len(), 2);
    assert_eq!(reg.mqtt().publishes().len(), 2);

    // Forced reopen with an unchanged role does the same
    reg.mqtt_mut().clear_recordings();
    block_on(reg.open_subscriptions(false, true)).unwrap();
    assert_eq!(reg.mqtt().unsubscribes().len(), 2);
    assert_eq!(reg.mqtt().subscribes().len(), 2);
}

#[test]
fn test_wildcard_mode_shares_one_subscription() {
    static A: ParamCell = ParamCell::new(ParamValue::I32(1));
    static B: ParamCell = ParamCell::new(ParamValue::I32(2));
    let cfg = RegistryConfig {
        wildcard: true,
        ..config()
    };
    let mut reg = registry(cfg, NullNotifier);
    let a = reg
        .register(RegisterRequest::parameter(ParamType::I32, None, "alpha", "Alpha", &A))
        .unwrap();
    reg.register(RegisterRequest::parameter(ParamType::I32, None, "beta", "Beta", &B))
        .unwrap();
    reg.register(RegisterRequest::signal("doorbell", ParamHandler::None, false))
        .unwrap();

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();

    // One wildcard covers both parameters; the signal subscribes directly
    assert_eq!(reg.mqtt().subscribes().len(), 2);
    assert_eq!(reg.mqtt().subscribes()[0].as_str(), "params/home/boiler/#");
    assert_eq!(reg.mqtt().subscribes()[1].as_str(), "params/home/boiler/doorbell");

    // Routing still hits the exact per-entry topic
    reg.on_incoming_message("params/home/boiler/alpha", "7");
    assert_eq!(A.get(), ParamValue::I32(7));
    assert_eq!(B.get(), ParamValue::I32(2));
    assert!(reg.entry(a).unwrap().subscribed());

    reg.mqtt_mut().clear_recordings();
    reg.close_subscriptions();
    assert_eq!(reg.mqtt().unsubscribes().len(), 2);
    assert_eq!(reg.mqtt().unsubscribes()[0].as_str(), "params/home/boiler/#");
}

#[test]
fn test_restore_fires_handler_and_notifier() {
    static EVENTS: EventChannel = EventChannel::new();
    static WINDOW: ParamCell = ParamCell::new(ParamValue::U32(60));
    let mut reg = registry(config(), RecordingNotifier::default());
    reg.store_mut().seed("", "window", ParamValue::U32(90));

    let id = reg
        .register(
            RegisterRequest::parameter(ParamType::U32, None, "window", "Window", &WINDOW)
                .with_handler(ParamHandler::Event(&EVENTS)),
        )
        .unwrap();

    assert_eq!(WINDOW.get(), ParamValue::U32(90));
    assert_eq!(
        EVENTS.try_receive(),
        Ok(ParamEvent {
            entry: id,
            mode: ChangeMode::NvsRestored
        })
    );
    assert_eq!(
        reg.notifier().restored,
        vec![("window".to_string(), "90".to_string())]
    );

    // A transport update later fires the same channel with SetChanged
    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();
    reg.on_incoming_message("params/home/boiler/window", "120");
    assert_eq!(
        EVENTS.try_receive(),
        Ok(ParamEvent {
            entry: id,
            mode: ChangeMode::SetChanged
        })
    );
}

#[test]
fn test_unmatched_topic_is_reported_not_fatal() {
    struct UnhandledRecorder(Vec<String>);
    impl Notifier for UnhandledRecorder {
        fn unhandled_topic(&mut self, topic: &str) {
            self.0.push(topic.to_string());
        }
    }

    let mut reg = registry(config(), UnhandledRecorder(Vec::new()));
    reg.on_incoming_message("params/home/boiler/unknown", "1");
    assert_eq!(reg.notifier().0, vec!["params/home/boiler/unknown".to_string()]);
}

#[test]
fn test_location_parameter_republish_disabled_by_default() {
    static SHARED: ParamCell = ParamCell::new(ParamValue::I32(5));
    let mut reg = registry(config(), NullNotifier);
    reg.register(RegisterRequest::parameter_location(
        ParamType::I32,
        None,
        "shared",
        "Shared",
        &SHARED,
    ))
    .unwrap();

    reg.mqtt_mut().set_connected(true);
    block_on(reg.open_subscriptions(true, false)).unwrap();

    // Subscribed without the device segment, but never confirmed back
    assert_eq!(reg.mqtt().subscribes()[0].as_str(), "params/home/shared");
    assert!(reg.mqtt().publishes().is_empty());

    reg.on_incoming_message("params/home/shared", "6");
    assert_eq!(SHARED.get(), ParamValue::I32(6));
    assert!(reg.mqtt().publishes().is_empty());
    assert_eq!(reg.store().stored("", "shared"), Some(&ParamValue::I32(6)));
}
