//! System control hooks
//!
//! The registry only triggers firmware updates, command execution and
//! restarts; the side effects live behind this trait. `start_ota` and
//! `restart` are terminal on real hardware and do not return control.

use heapless::{String, Vec};

/// System action sink
pub trait SystemControl {
    /// Begin a firmware update from the given URL
    fn start_ota(&mut self, url: &str);

    /// Execute a non-built-in command payload
    fn execute_command(&mut self, command: &str);

    /// Restart the device
    fn restart(&mut self);
}

/// Control sink that only logs (for bring-up and examples)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullControl;

impl SystemControl for NullControl {
    fn start_ota(&mut self, url: &str) {
        crate::log_warn!("OTA trigger ignored: {}", url);
    }

    fn execute_command(&mut self, command: &str) {
        crate::log_warn!("Command ignored: {}", command);
    }

    fn restart(&mut self) {
        crate::log_warn!("Restart request ignored");
    }
}

/// Recording control sink for host tests
#[derive(Debug, Default)]
pub struct MockControl {
    ota_urls: Vec<String<96>, 4>,
    commands: Vec<String<64>, 8>,
    restarts: u32,
}

impl MockControl {
    /// Create an inert recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs passed to `start_ota`, in call order
    pub fn ota_urls(&self) -> &[String<96>] {
        &self.ota_urls
    }

    /// Commands passed to `execute_command`, in call order
    pub fn commands(&self) -> &[String<64>] {
        &self.commands
    }

    /// Number of restart requests
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
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

impl SystemControl for MockControl {
    fn start_ota(&mut self, url: &str) {
        let _ = self.ota_urls.push(copy_str(url));
    }

    fn execute_command(&mut self, command: &str) {
        let _ = self.commands.push(copy_str(command));
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}
