//! Mock parameter store for host tests
//!
//! In-memory store with write counting and failure injection. Keys are the
//! `group.key` composite, matching the scheme real backends use.

use heapless::{FnvIndexMap, String};

use super::ParamStore;
use crate::error::StoreError;
use crate::value::{ParamType, ParamValue};

/// Composite key capacity
const KEY_LEN: usize = 80;

/// Maximum records the mock can hold (must be a power of two)
const MAX_RECORDS: usize = 32;

/// In-memory mock store
///
/// Supports:
/// - Seeding records before registration (restore-path testing)
/// - Write/commit counting
/// - Write failure injection
#[derive(Debug, Default)]
pub struct MockStore {
    records: FnvIndexMap<String<KEY_LEN>, ParamValue, MAX_RECORDS>,
    write_count: u32,
    commit_count: u32,
    fail_writes: bool,
}

fn composite(group: &str, key: &str) -> String<KEY_LEN> {
    let mut out = String::new();
    if !group.is_empty() {
        let _ = out.push_str(group);
        let _ = out.push('.');
    }
    let _ = out.push_str(key);
    out
}

impl MockStore {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if written by a previous boot
    pub fn seed(&mut self, group: &str, key: &str, value: ParamValue) {
        let _ = self.records.insert(composite(group, key), value);
    }

    /// Look up a record for test verification
    pub fn stored(&self, group: &str, key: &str) -> Option<&ParamValue> {
        self.records.get(&composite(group, key))
    }

    /// Number of successful writes
    pub fn write_count(&self) -> u32 {
        self.write_count
    }

    /// Number of commits
    pub fn commit_count(&self) -> u32 {
        self.commit_count
    }

    /// Make subsequent writes fail (for error-path testing)
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl ParamStore for MockStore {
    fn read(&mut self, group: &str, key: &str, ty: ParamType) -> Option<ParamValue> {
        let value = self.records.get(&composite(group, key))?;
        if value.param_type() != ty {
            return None;
        }
        Some(value.clone())
    }

    fn write(&mut self, group: &str, key: &str, value: &ParamValue) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::WriteFailed);
        }
        self.records
            .insert(composite(group, key), value.clone())
            .map_err(|_| StoreError::Full)?;
        self.write_count += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.commit_count += 1;
        Ok(())
    }
}
