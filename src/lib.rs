#![cfg_attr(not(test), no_std)]

//! mqtt-params - Parameter registry for MQTT-connected embedded devices
//!
//! Named, typed configuration values owned by firmware memory, persisted to
//! key-value storage and mirrored onto MQTT topics: inbound messages update
//! values through a validating state machine, accepted values are persisted
//! and re-published for confirmation, and dedicated topics dispatch OTA,
//! command and signal actions.
//!
//! The registry is transport- and storage-agnostic: firmware supplies
//! implementations of [`mqtt::MqttInterface`], [`storage::ParamStore`],
//! [`control::SystemControl`] and [`notify::Notifier`], and wraps the
//! registry in an async mutex shared between its MQTT event task and
//! application tasks.

// Logging macros (defmt on target, println in host tests)
pub mod logging;

// Error taxonomy shared by storage and transport
pub mod error;

// Typed values, text codec and the shared value cell
pub mod value;

// Persistent key-value store abstraction and debounced commit task
pub mod storage;

// Transport abstraction
pub mod mqtt;

// The registry itself: groups, entries, topics, state machine
pub mod params;

// Consumer-facing notification bridge
pub mod notify;

// System action sink (OTA / command / restart)
pub mod control;

// Daily quiet-window supplement
pub mod silent;

pub use error::{ParamsError, Result, StoreError, TransportError};
pub use params::entry::RegisterRequest;
pub use params::registry::ParamRegistry;
pub use params::{ChangeMode, EntryId, GroupId, ParamKind, RegistryConfig};
pub use value::{ParamCell, ParamType, ParamValue};

// Host tests need the std critical-section implementation linked in
#[cfg(test)]
use critical_section as _;
