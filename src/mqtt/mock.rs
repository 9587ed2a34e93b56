//! Mock MQTT client for host tests
//!
//! Records every call and lets tests script connection state, outbox depth
//! and failure injection, including a connection drop after N subscribe
//! calls to exercise the mid-loop abort path.

use heapless::{String, Vec};

use super::{MqttInterface, Qos};
use crate::error::TransportError;

/// Recorded topic capacity
const TOPIC_LEN: usize = 128;

/// Recorded payload capacity
const PAYLOAD_LEN: usize = 64;

/// Maximum recorded operations per kind
const MAX_OPS: usize = 32;

/// One recorded publish call
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRecord {
    pub topic: String<TOPIC_LEN>,
    pub payload: Option<String<PAYLOAD_LEN>>,
    pub qos: Qos,
    pub retained: bool,
}

/// Recording mock client
#[derive(Debug, Default)]
pub struct MockMqtt {
    connected: bool,
    outbox_depth: usize,
    publishes: Vec<PublishRecord, MAX_OPS>,
    subscribes: Vec<String<TOPIC_LEN>, MAX_OPS>,
    unsubscribes: Vec<String<TOPIC_LEN>, MAX_OPS>,
    fail_subscribes: bool,
    drop_after_subscribes: Option<usize>,
    restart_requested: bool,
}

/// Copy as much of `s` as fits, never splitting a char
fn copy_str<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl MockMqtt {
    /// Create a disconnected mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connected mock
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    /// Set the connection flag
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Script the reported outbox depth
    pub fn set_outbox_depth(&mut self, depth: usize) {
        self.outbox_depth = depth;
    }

    /// Make subscribe calls fail
    pub fn fail_subscribes(&mut self, fail: bool) {
        self.fail_subscribes = fail;
    }

    /// Drop the connection after `n` further successful subscribes
    pub fn drop_after_subscribes(&mut self, n: usize) {
        self.drop_after_subscribes = Some(n);
    }

    /// All recorded publishes, in call order
    pub fn publishes(&self) -> &[PublishRecord] {
        &self.publishes
    }

    /// Most recent publish, if any
    pub fn last_publish(&self) -> Option<&PublishRecord> {
        self.publishes.last()
    }

    /// All subscribed topics, in call order
    pub fn subscribes(&self) -> &[String<TOPIC_LEN>] {
        &self.subscribes
    }

    /// All unsubscribed topics, in call order
    pub fn unsubscribes(&self) -> &[String<TOPIC_LEN>] {
        &self.unsubscribes
    }

    /// Whether a transport restart was requested
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Clear all recordings (keeps connection state)
    pub fn clear_recordings(&mut self) {
        self.publishes.clear();
        self.subscribes.clear();
        self.unsubscribes.clear();
        self.restart_requested = false;
    }
}

impl MqttInterface for MockMqtt {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn outbox_depth(&self) -> usize {
        self.outbox_depth
    }

    fn publish(
        &mut self,
        topic: &str,
        payload: Option<&str>,
        qos: Qos,
        retained: bool,
    ) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::PublishFailed);
        }
        self.publishes
            .push(PublishRecord {
                topic: copy_str(topic),
                payload: payload.map(copy_str),
                qos,
                retained,
            })
            .map_err(|_| TransportError::PublishFailed)?;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), TransportError> {
        let _ = qos;
        if !self.connected || self.fail_subscribes {
            return Err(TransportError::SubscribeFailed);
        }
        self.subscribes
            .push(copy_str(topic))
            .map_err(|_| TransportError::SubscribeFailed)?;
        if let Some(n) = self.drop_after_subscribes {
            if self.subscribes.len() >= n {
                self.connected = false;
                self.drop_after_subscribes = None;
            }
        }
        Ok(())
    }

    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.unsubscribes
            .push(copy_str(topic))
            .map_err(|_| TransportError::UnsubscribeFailed)?;
        Ok(())
    }

    fn request_restart(&mut self) {
        self.restart_requested = true;
    }
}
