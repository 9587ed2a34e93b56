//! MQTT client interface
//!
//! The registry never talks to the network directly; it drives a client
//! through this trait. Calls are enqueue-style and return as soon as the
//! request is queued, so the registry lock is never held across actual
//! network I/O. The client delivers connection events and incoming messages
//! back to the registry from its own task.

pub mod mock;

pub use mock::MockMqtt;

use crate::error::TransportError;

/// MQTT quality-of-service level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Qos {
    /// Fire and forget
    AtMostOnce = 0,
    /// Acknowledged delivery
    AtLeastOnce = 1,
    /// Assured single delivery
    ExactlyOnce = 2,
}

impl Qos {
    /// Parse from the wire-level numeric value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Qos::AtMostOnce),
            1 => Some(Qos::AtLeastOnce),
            2 => Some(Qos::ExactlyOnce),
            _ => None,
        }
    }
}

/// Enqueue-style MQTT client surface consumed by the registry
pub trait MqttInterface {
    /// Whether the client currently holds a broker connection
    fn is_connected(&self) -> bool;

    /// Number of messages waiting in the client's outbox
    ///
    /// Bulk resubscribe throttles against this so a freshly reconnected
    /// link is not flooded.
    fn outbox_depth(&self) -> usize;

    /// Queue a publish; `None` payload publishes an empty message (used to
    /// clear a retained topic)
    fn publish(
        &mut self,
        topic: &str,
        payload: Option<&str>,
        qos: Qos,
        retained: bool,
    ) -> Result<(), TransportError>;

    /// Queue a subscribe request
    fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), TransportError>;

    /// Queue an unsubscribe request
    fn unsubscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Ask the transport layer to restart the connection
    ///
    /// Called when a bulk operation detects a mid-loop disconnect and the
    /// registry has torn its subscriptions down.
    fn request_restart(&mut self);
}
