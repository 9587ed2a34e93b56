//! Parameter registry
//!
//! The central state machine of the crate: a flat, insertion-ordered set of
//! registered entries plus a group tree for namespacing, mirrored onto MQTT
//! topics and persisted through a [`ParamStore`](crate::storage::ParamStore).
//!
//! See [`registry::ParamRegistry`] for the operations; this module holds the
//! shared vocabulary types.

pub mod entry;
pub mod groups;
pub mod handler;
pub mod registry;
pub mod topics;

pub use entry::{EntryFlags, ParamEntry, RegisterRequest};
pub use groups::GroupTree;
pub use handler::{ChangeHandler, EventChannel, ParamEvent, ParamHandler};
pub use registry::ParamRegistry;

use crate::mqtt::Qos;

/// Maximum registered entries
pub const MAX_ENTRIES: usize = 64;

/// Maximum group tree nodes
pub const MAX_GROUPS: usize = 16;

/// Maximum topic string length
pub const MAX_TOPIC_LEN: usize = 128;

/// Maximum composite group key / friendly-name length
pub const MAX_NAME_LEN: usize = 64;

/// Stable identity of a registered entry (index into registration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    /// Position in registration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Stable identity of a group tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// Position in creation order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Entry kind: determines persistence, topic shape and dispatch behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Persisted device parameter
    Parameter,
    /// Device parameter, not persisted
    ParameterOnline,
    /// Persisted parameter shared by all devices in a location
    ParameterLocation,
    /// Location-scoped telemetry, inbound only, not persisted
    LocDataOnline,
    /// Location-scoped telemetry, inbound only, persisted
    LocDataStored,
    /// Externally-sourced data on a verbatim topic, not persisted
    ExtDataOnline,
    /// Externally-sourced data on a verbatim topic, persisted
    ExtDataStored,
    /// Momentary trigger
    Signal,
    /// Momentary trigger that clears its retained payload after firing
    SignalAutoClear,
    /// System command endpoint
    Command,
    /// Firmware update trigger
    Ota,
}

impl ParamKind {
    /// Whether values of this kind are written to the persistent store
    pub fn persisted(self) -> bool {
        matches!(
            self,
            ParamKind::Parameter
                | ParamKind::ParameterLocation
                | ParamKind::LocDataStored
                | ParamKind::ExtDataStored
        )
    }

    /// Whether this kind carries a typed value (as opposed to an action)
    pub fn value_bearing(self) -> bool {
        !matches!(
            self,
            ParamKind::Signal | ParamKind::SignalAutoClear | ParamKind::Command | ParamKind::Ota
        )
    }

    /// Whether a confirmation topic may exist for this kind
    ///
    /// Location parameters confirm only when
    /// [`RegistryConfig::republish_location`] allows it; that policy check
    /// lives in the registry.
    pub fn confirmable(self) -> bool {
        matches!(
            self,
            ParamKind::Parameter | ParamKind::ParameterOnline | ParamKind::ParameterLocation
        )
    }

    /// Whether the shared wildcard subscription covers this kind
    pub fn wildcard_covered(self) -> bool {
        matches!(self, ParamKind::Parameter | ParamKind::ParameterOnline)
    }
}

/// Why a change handler is being invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeMode {
    /// Value changed via an external (transport) update
    SetChanged,
    /// Value was mutated in place by local code and re-published
    SetInternal,
    /// Value restored from the persistent store differed from the in-memory
    /// default at registration
    NvsRestored,
}

/// Registry configuration
///
/// One explicit object constructed at process start; replaces the ambient
/// compile-time defines the topic grammar is usually driven by.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Device name, the most specific topic scope segment
    pub device: &'static str,
    /// Location name shared by co-located devices
    pub location: &'static str,
    /// Root scope for parameter topics
    pub params_root: &'static str,
    /// Root scope for system command/OTA topics
    pub system_root: &'static str,
    /// Root scope for location telemetry topics
    pub locdata_root: &'static str,
    /// Root scope substituted for `params_root` on confirmation topics
    pub confirm_root: &'static str,
    /// Key of the built-in OTA entry ("" disables it)
    pub ota_key: &'static str,
    /// Key of the built-in command entry ("" disables it)
    pub command_key: &'static str,
    /// Command payload that restarts the device
    pub restart_command: &'static str,
    /// Default QoS for parameter subscriptions
    pub default_qos: Qos,
    /// QoS for system (command/OTA) subscriptions
    pub system_qos: Qos,
    /// QoS for confirmation publishes
    pub confirm_qos: Qos,
    /// Whether confirmation publishing is enabled at all
    pub confirm_enabled: bool,
    /// Whether confirmation publishes are retained
    pub confirm_retained: bool,
    /// Use one wildcard subscription for all device parameters
    pub wildcard: bool,
    /// Whether accepted location-parameter values are re-published
    pub republish_location: bool,
    /// Soft warning threshold for composite group key length
    pub max_group_key_len: usize,
    /// Outbox depth below which bulk resubscribe proceeds
    pub backlog_threshold: usize,
    /// Bounded number of backlog polls before proceeding anyway
    pub backlog_poll_limit: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            device: "device",
            location: "local",
            params_root: "params",
            system_root: "system",
            locdata_root: "locdata",
            confirm_root: "confirm",
            ota_key: "ota",
            command_key: "command",
            restart_command: "restart",
            default_qos: Qos::AtLeastOnce,
            system_qos: Qos::ExactlyOnce,
            confirm_qos: Qos::AtMostOnce,
            confirm_enabled: true,
            confirm_retained: true,
            wildcard: false,
            republish_location: false,
            max_group_key_len: 24,
            backlog_threshold: 4,
            backlog_poll_limit: 50,
        }
    }
}
