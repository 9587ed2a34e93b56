//! Notification bridge
//!
//! Outbound user-facing alerts (chat bot, display, ...) hang off this trait.
//! The registry calls it at well-defined points; delivery itself is the
//! implementor's business and must not block.

/// Identity of the entry a notification refers to
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo<'a> {
    /// Local key
    pub key: &'a str,
    /// Display name
    pub friendly: &'a str,
    /// Composite group key ("" for root entries)
    pub group: &'a str,
}

/// Consumer-facing notification sink
///
/// Every method has an empty default body so implementors pick only the
/// events they care about. Value-change notifications carry display strings
/// so the sink never needs the codec.
pub trait Notifier {
    /// Value accepted and changed; `old`/`new` are display encodings
    fn changed(&mut self, entry: EntryInfo<'_>, old: &str, new: &str) {
        let _ = (entry, old, new);
    }

    /// Incoming value equal to the current one, ignored
    fn equal(&mut self, entry: EntryInfo<'_>) {
        let _ = entry;
    }

    /// Incoming payload failed to parse
    fn bad_value(&mut self, entry: EntryInfo<'_>, payload: &str) {
        let _ = (entry, payload);
    }

    /// Incoming value outside the entry's [min, max]
    fn out_of_range(&mut self, entry: EntryInfo<'_>, payload: &str) {
        let _ = (entry, payload);
    }

    /// Value restored from storage differed from the in-memory default
    fn restored(&mut self, entry: EntryInfo<'_>, value: &str) {
        let _ = (entry, value);
    }

    /// Firmware update triggered with the given URL
    fn ota_started(&mut self, url: &str) {
        let _ = url;
    }

    /// Command received over the transport
    fn command_received(&mut self, command: &str) {
        let _ = command;
    }

    /// Incoming message matched no entry
    fn unhandled_topic(&mut self, topic: &str) {
        let _ = topic;
    }

    /// Silent-mode window opened or closed
    fn silent_mode(&mut self, active: bool) {
        let _ = active;
    }
}

/// Notifier that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {}
