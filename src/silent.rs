//! Silent-mode window
//!
//! A daily quiet window stored in a TimeSpan parameter (`HHMMhhmm`). The
//! firmware feeds wall-clock time into [`SilentMode::check`] from its clock
//! tick; edges drive an optional callback and the notifier so consumers can
//! mute sounds or notifications while the window is open.

use crate::error::Result;
use crate::notify::Notifier;
use crate::params::entry::RegisterRequest;
use crate::params::registry::ParamRegistry;
use crate::params::{EntryId, GroupId};
use crate::value::{ParamCell, ParamType};
use crate::{control::SystemControl, mqtt::MqttInterface, storage::ParamStore};

/// Whether `hour:minute` falls inside the packed `HHMMhhmm` window
///
/// The window may wrap midnight (start > end). An empty window
/// (start == end, including the all-zero default) is never active.
pub fn window_contains(window: u32, hour: u8, minute: u8) -> bool {
    let start = window / 10000;
    let end = window % 10000;
    if start == end {
        return false;
    }
    let now = u32::from(hour) * 100 + u32::from(minute);
    if start < end {
        now >= start && now < end
    } else {
        !(now >= end && start > now)
    }
}

/// Edge-triggered silent-mode tracker
///
/// Owns no time source: the caller ticks it with the current wall time.
pub struct SilentMode {
    cell: &'static ParamCell,
    callback: Option<fn(bool)>,
    active: bool,
}

impl SilentMode {
    /// Track the window stored in `cell`
    pub const fn new(cell: &'static ParamCell) -> Self {
        Self {
            cell,
            callback: None,
            active: false,
        }
    }

    /// Attach an edge callback
    pub const fn with_callback(mut self, callback: fn(bool)) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Register the window as a persisted TimeSpan parameter
    pub fn register<M, S, C, N>(
        &self,
        registry: &mut ParamRegistry<M, S, C, N>,
        group: Option<GroupId>,
        key: &'static str,
        friendly: &'static str,
    ) -> Result<EntryId>
    where
        M: MqttInterface,
        S: ParamStore,
        C: SystemControl,
        N: Notifier,
    {
        registry.register(RegisterRequest::parameter(
            ParamType::TimeSpan,
            group,
            key,
            friendly,
            self.cell,
        ))
    }

    /// Current state as of the last `check`
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Recompute the state for the given wall time
    ///
    /// Fires the callback and `Notifier::silent_mode` only on edges.
    /// Returns the (possibly unchanged) state.
    pub fn check<N: Notifier>(&mut self, hour: u8, minute: u8, notifier: &mut N) -> bool {
        let window = match self.cell.get() {
            crate::value::ParamValue::TimeSpan(v) => v,
            _ => 0,
        };
        let active = window_contains(window, hour, minute);
        if active != self.active {
            self.active = active;
            if active {
                crate::log_info!("Silent mode activated");
            } else {
                crate::log_info!("Silent mode deactivated");
            }
            if let Some(callback) = self.callback {
                callback(active);
            }
            notifier.silent_mode(active);
        }
        self.active
    }
}
