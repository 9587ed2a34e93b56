//! Registered parameter entries

use bitflags::bitflags;
use heapless::String;

use super::handler::ParamHandler;
use super::{GroupId, ParamKind, MAX_TOPIC_LEN};
use crate::mqtt::Qos;
use crate::value::{ParamCell, ParamLimits, ParamType};

bitflags! {
    /// Entry state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFlags: u8 {
        /// A subscription for this entry is active (directly or via wildcard)
        const SUBSCRIBED = 0b0000_0001;
        /// One-shot echo suppression: the next inbound message on this
        /// entry's topic is our own publish coming back and must be swallowed
        const LOCKED = 0b0000_0010;
        /// Change/equal/invalid/restored events are forwarded to the notifier
        const NOTIFY = 0b0000_0100;
    }
}

/// One registered value or action endpoint
///
/// The entry does not own its value: `cell` points at firmware-owned memory
/// that other subsystems read directly. Topic strings are owned, created
/// lazily on first transport need and freed on every disconnect.
pub struct ParamEntry {
    /// Kind tag (persistence, topic shape, dispatch)
    pub kind: ParamKind,
    /// Declared value type
    pub value_type: ParamType,
    /// Change handler capability
    pub handler: ParamHandler,
    /// Owning group, if any
    pub group: Option<GroupId>,
    /// Local key, unique within the group (case-insensitive)
    pub key: &'static str,
    /// Display name for notifications
    pub friendly: &'static str,
    /// Subscription QoS
    pub qos: Qos,
    /// Externally-owned value cell (None for action kinds)
    pub cell: Option<&'static ParamCell>,
    /// Optional [min, max] clamp bounds
    pub limits: Option<ParamLimits>,
    /// Subscribe topic, present iff the entry is provisioned
    pub topic: Option<String<MAX_TOPIC_LEN>>,
    /// Confirmation (publish) topic, created lazily
    pub confirm: Option<String<MAX_TOPIC_LEN>>,
    /// State flags
    pub flags: EntryFlags,
}

impl ParamEntry {
    /// Whether the entry currently has transport topics
    pub fn provisioned(&self) -> bool {
        self.topic.is_some()
    }

    /// Whether a subscription is active
    pub fn subscribed(&self) -> bool {
        self.flags.contains(EntryFlags::SUBSCRIBED)
    }

    /// Whether the one-shot echo lock is set
    pub fn locked(&self) -> bool {
        self.flags.contains(EntryFlags::LOCKED)
    }

    /// Whether notifier forwarding is enabled
    pub fn notify(&self) -> bool {
        self.flags.contains(EntryFlags::NOTIFY)
    }
}

/// Registration request
///
/// Built through the per-kind constructors; optional fields are plain
/// struct members so callers can override them before registering.
#[derive(Debug)]
pub struct RegisterRequest {
    pub kind: ParamKind,
    pub value_type: ParamType,
    pub handler: ParamHandler,
    pub group: Option<GroupId>,
    pub key: &'static str,
    pub friendly: &'static str,
    /// Subscription QoS; `None` uses the config default for the kind
    pub qos: Option<Qos>,
    pub cell: Option<&'static ParamCell>,
    pub notify: bool,
}

impl RegisterRequest {
    fn base(kind: ParamKind, value_type: ParamType, key: &'static str) -> Self {
        Self {
            kind,
            value_type,
            handler: ParamHandler::None,
            group: None,
            key,
            friendly: key,
            qos: None,
            cell: None,
            notify: true,
        }
    }

    /// Persisted device parameter
    pub fn parameter(
        value_type: ParamType,
        group: Option<GroupId>,
        key: &'static str,
        friendly: &'static str,
        cell: &'static ParamCell,
    ) -> Self {
        Self {
            group,
            friendly,
            cell: Some(cell),
            ..Self::base(ParamKind::Parameter, value_type, key)
        }
    }

    /// Device parameter without persistence
    pub fn parameter_online(
        value_type: ParamType,
        group: Option<GroupId>,
        key: &'static str,
        friendly: &'static str,
        cell: &'static ParamCell,
    ) -> Self {
        Self {
            group,
            friendly,
            cell: Some(cell),
            ..Self::base(ParamKind::ParameterOnline, value_type, key)
        }
    }

    /// Location-shared persisted parameter
    pub fn parameter_location(
        value_type: ParamType,
        group: Option<GroupId>,
        key: &'static str,
        friendly: &'static str,
        cell: &'static ParamCell,
    ) -> Self {
        Self {
            group,
            friendly,
            cell: Some(cell),
            ..Self::base(ParamKind::ParameterLocation, value_type, key)
        }
    }

    /// Inbound-only data entry of the given kind
    pub fn data(
        kind: ParamKind,
        value_type: ParamType,
        group: Option<GroupId>,
        key: &'static str,
        cell: &'static ParamCell,
    ) -> Self {
        Self {
            group,
            cell: Some(cell),
            ..Self::base(kind, value_type, key)
        }
    }

    /// Momentary trigger
    pub fn signal(key: &'static str, handler: ParamHandler, auto_clear: bool) -> Self {
        let kind = if auto_clear {
            ParamKind::SignalAutoClear
        } else {
            ParamKind::Signal
        };
        Self {
            handler,
            ..Self::base(kind, ParamType::Str, key)
        }
    }

    /// System command endpoint
    pub fn command(key: &'static str) -> Self {
        Self::base(ParamKind::Command, ParamType::Str, key)
    }

    /// Firmware update trigger
    pub fn ota(key: &'static str) -> Self {
        Self::base(ParamKind::Ota, ParamType::Str, key)
    }

    /// Attach a change handler
    pub fn with_handler(mut self, handler: ParamHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Override the subscription QoS
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = Some(qos);
        self
    }

    /// Disable notifier forwarding for this entry
    pub fn silent(mut self) -> Self {
        self.notify = false;
        self
    }
}
