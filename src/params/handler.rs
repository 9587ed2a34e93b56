//! Change handler dispatch
//!
//! Each entry carries one handler capability, selected at registration and
//! invoked through a single call site that branches on the tag once.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use super::{ChangeMode, EntryId};

/// Event queue depth for [`ParamHandler::Event`] channels
pub const EVENT_QUEUE_LEN: usize = 8;

/// Change event posted to an event channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamEvent {
    /// Entry whose value changed
    pub entry: EntryId,
    /// Why the handler fired
    pub mode: ChangeMode,
}

/// Channel type carrying change events
pub type EventChannel = Channel<CriticalSectionRawMutex, ParamEvent, EVENT_QUEUE_LEN>;

/// Polymorphic change handler object
pub trait ChangeHandler: Sync {
    /// Invoked after the entry's value cell has been updated
    fn on_change(&self, entry: EntryId, mode: ChangeMode);
}

/// Per-entry handler capability
#[derive(Clone, Copy)]
pub enum ParamHandler {
    /// No notification
    None,
    /// Post a [`ParamEvent`] to a channel (dropped if the queue is full)
    Event(&'static EventChannel),
    /// Plain function callback
    Callback(fn(EntryId, ChangeMode)),
    /// Polymorphic handler object
    Object(&'static dyn ChangeHandler),
}

impl ParamHandler {
    /// Invoke the handler, whatever its kind
    pub fn invoke(&self, entry: EntryId, mode: ChangeMode) {
        match self {
            ParamHandler::None => {}
            ParamHandler::Event(channel) => {
                if channel.try_send(ParamEvent { entry, mode }).is_err() {
                    crate::log_warn!("Change event queue full, event dropped");
                }
            }
            ParamHandler::Callback(callback) => callback(entry, mode),
            ParamHandler::Object(object) => object.on_change(entry, mode),
        }
    }
}

impl core::fmt::Debug for ParamHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tag = match self {
            ParamHandler::None => "None",
            ParamHandler::Event(_) => "Event",
            ParamHandler::Callback(_) => "Callback",
            ParamHandler::Object(_) => "Object",
        };
        write!(f, "ParamHandler::{}", tag)
    }
}
