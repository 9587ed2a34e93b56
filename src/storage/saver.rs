//! Debounced store commit task
//!
//! Flushing staged parameter writes to non-volatile memory is the expensive
//! part of persistence (flash erase cycles). This task batches commit
//! requests: multiple requests within the debounce window collapse into a
//! single `ParamStore::commit`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};

use super::ParamStore;

/// Commit request message
#[derive(Debug, Clone, Copy)]
pub enum CommitRequest {
    /// Schedule a commit (will be debounced)
    Schedule,
    /// Force immediate commit (bypass debounce)
    Immediate,
}

/// Channel type carrying commit requests
pub type CommitChannel = Channel<CriticalSectionRawMutex, CommitRequest, 4>;

/// Debounced commit manager
///
/// Owns the receiving end of a commit-request channel. Value writes go to
/// the store immediately (so a crash loses at most the uncommitted window);
/// only the commit itself is deferred.
pub struct StoreSaver {
    channel: &'static CommitChannel,
}

impl StoreSaver {
    /// Create a saver draining the given global channel
    pub fn new(channel: &'static CommitChannel) -> Self {
        Self { channel }
    }

    /// Schedule a commit (debounced)
    pub async fn schedule(&self) {
        self.channel.send(CommitRequest::Schedule).await;
    }

    /// Request an immediate commit
    pub async fn commit_now(&self) {
        self.channel.send(CommitRequest::Immediate).await;
    }

    /// Non-blocking schedule, dropped if the queue is full
    ///
    /// A full queue means a commit is already pending, so dropping is safe.
    pub fn try_schedule(&self) {
        let _ = self.channel.try_send(CommitRequest::Schedule);
    }

    /// Run the commit task (call from the async executor)
    ///
    /// Requests arriving within `debounce_ms` of each other are collapsed
    /// into one commit; `Immediate` short-circuits the window.
    pub async fn run_task<S: ParamStore>(
        &self,
        store: &'static embassy_sync::mutex::Mutex<CriticalSectionRawMutex, S>,
        debounce_ms: u64,
    ) {
        loop {
            let request = self.channel.receive().await;

            if matches!(request, CommitRequest::Schedule) {
                let mut pending = true;
                while pending {
                    match embassy_futures::select::select(
                        Timer::after(Duration::from_millis(debounce_ms)),
                        self.channel.receive(),
                    )
                    .await
                    {
                        embassy_futures::select::Either::First(_) => {
                            pending = false;
                        }
                        embassy_futures::select::Either::Second(CommitRequest::Schedule) => {
                            // Window restarts, keep waiting
                        }
                        embassy_futures::select::Either::Second(CommitRequest::Immediate) => {
                            pending = false;
                        }
                    }
                }
            }

            let mut store = store.lock().await;
            match store.commit() {
                Ok(_) => crate::log_debug!("Parameter store committed"),
                Err(_e) => crate::log_error!("Parameter store commit failed"),
            }
        }
    }
}
