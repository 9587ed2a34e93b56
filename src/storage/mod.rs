//! Persistent parameter storage interface
//!
//! The registry persists values through this trait and never defines the
//! store's own binary layout; implementors map the (group, key) scheme onto
//! whatever non-volatile backend they have (ESP-IDF NVS, flash blocks, a
//! file on the host). Writes may be staged in RAM; `commit` pushes staged
//! writes to non-volatile memory and is what the debounced [`saver`] task
//! batches.

pub mod mock;
pub mod saver;

pub use mock::MockStore;
pub use saver::{CommitRequest, StoreSaver};

use crate::error::StoreError;
use crate::value::{ParamType, ParamValue};

/// Typed per-(group, key) persistent store
pub trait ParamStore {
    /// Read a stored value
    ///
    /// `group` is the composite group key ("" for root-level entries).
    /// Returns `None` when no record exists or the record's type does not
    /// match `ty` - both are ordinary at first boot.
    fn read(&mut self, group: &str, key: &str, ty: ParamType) -> Option<ParamValue>;

    /// Write (stage) a value
    fn write(&mut self, group: &str, key: &str, value: &ParamValue) -> Result<(), StoreError>;

    /// Flush staged writes to non-volatile memory
    fn commit(&mut self) -> Result<(), StoreError>;
}
