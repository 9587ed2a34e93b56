//! Error types for the parameter registry
//!
//! Every fault in this crate is recoverable: operations log, abort locally
//! and leave the registry in a continuable state. Errors are surfaced to the
//! caller only where a retry decision belongs to the caller (bulk subscribe,
//! registration capacity).

use core::fmt;

/// Result type for registry operations
pub type Result<T> = core::result::Result<T, ParamsError>;

/// Registry-level errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    /// Persistent store operation failed
    Store(StoreError),
    /// Transport operation failed
    Transport(TransportError),
    /// Topic or composite-string construction failed (capacity overflow)
    TopicBuild,
    /// Payload could not be parsed into the target type
    Parse,
    /// Value outside the configured [min, max] range
    OutOfRange,
    /// Value type does not match the entry's registered type
    TypeMismatch,
    /// Entry list is full
    RegistryFull,
    /// Group tree is full
    GroupsFull,
    /// No entry with the given identity
    NotFound,
}

/// Persistent store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Read operation failed
    ReadFailed,
    /// Write operation failed
    WriteFailed,
    /// Commit to non-volatile memory failed
    CommitFailed,
    /// Stored record exists but has a different type
    WrongType,
    /// Store capacity exhausted
    Full,
}

/// Transport (MQTT client) errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Publish could not be queued
    PublishFailed,
    /// Subscribe request failed
    SubscribeFailed,
    /// Unsubscribe request failed
    UnsubscribeFailed,
    /// Connection dropped while an operation was in flight
    Disconnected,
}

impl From<StoreError> for ParamsError {
    fn from(err: StoreError) -> Self {
        ParamsError::Store(err)
    }
}

impl From<TransportError> for ParamsError {
    fn from(err: TransportError) -> Self {
        ParamsError::Transport(err)
    }
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::Store(e) => write!(f, "store error: {:?}", e),
            ParamsError::Transport(e) => write!(f, "transport error: {:?}", e),
            ParamsError::TopicBuild => write!(f, "topic construction failed"),
            ParamsError::Parse => write!(f, "payload parse failed"),
            ParamsError::OutOfRange => write!(f, "value out of range"),
            ParamsError::TypeMismatch => write!(f, "value type mismatch"),
            ParamsError::RegistryFull => write!(f, "entry list full"),
            ParamsError::GroupsFull => write!(f, "group tree full"),
            ParamsError::NotFound => write!(f, "entry not found"),
        }
    }
}
