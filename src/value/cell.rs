//! Externally-owned parameter value cell
//!
//! A `ParamCell` is the firmware-owned home of a parameter's live value.
//! Other subsystems read it directly without going through the registry, so
//! every access is wrapped in its own narrow critical section. This lock is
//! deliberately separate from (and much cheaper than) the registry-wide
//! mutex: it covers only the single read or write of the value.

use core::cell::RefCell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::ParamValue;

/// Shared parameter value cell
///
/// Constructed `const` so firmware can place cells in statics:
///
/// ```ignore
/// static THRESHOLD: ParamCell = ParamCell::new(ParamValue::I32(10));
/// ```
pub struct ParamCell {
    inner: Mutex<CriticalSectionRawMutex, RefCell<ParamValue>>,
}

impl ParamCell {
    /// Create a cell holding `initial`
    pub const fn new(initial: ParamValue) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(initial)),
        }
    }

    /// Read the current value (cloned out of the critical section)
    pub fn get(&self) -> ParamValue {
        self.inner.lock(|v| v.borrow().clone())
    }

    /// Overwrite the value
    pub fn set(&self, value: ParamValue) {
        self.inner.lock(|v| *v.borrow_mut() = value);
    }

    /// Access the value immutably inside the critical section
    pub fn with<R>(&self, f: impl FnOnce(&ParamValue) -> R) -> R {
        self.inner.lock(|v| f(&v.borrow()))
    }

    /// Access the value mutably inside the critical section
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut ParamValue) -> R) -> R {
        self.inner.lock(|v| f(&mut v.borrow_mut()))
    }
}

impl core::fmt::Debug for ParamCell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.with(|v| f.debug_tuple("ParamCell").field(v).finish())
    }
}
