//! In-memory calibration store
//!
//! Fixed-capacity key/value table for boards without flash storage, for
//! simulations and for tests. Records vanish at power-off.

use heapless::{String, Vec};

use crate::{
    errors::{StoreError, StoreResult},
    traits::{CalibrationStore, RecordText},
};

/// Longest key the store accepts (bytes)
pub const KEY_CAPACITY: usize = 32;

/// Volatile [`CalibrationStore`] holding up to `N` records
///
/// ```rust
/// use fireguard_core::store::MemoryStore;
/// use fireguard_core::CalibrationStore;
///
/// let mut store = MemoryStore::<4>::new();
/// store.write("smoke_cal_v1", "0,500,250,400,800,1500").unwrap();
/// assert_eq!(store.read("smoke_cal_v1").unwrap().unwrap().as_str(), "0,500,250,400,800,1500");
/// assert!(store.read("gas_cal_v1").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore<const N: usize = 4> {
    records: Vec<(String<KEY_CAPACITY>, RecordText), N>,
    read_only: bool,
}

impl<const N: usize> MemoryStore<N> {
    /// Empty, writable store
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            read_only: false,
        }
    }

    /// Reject every subsequent write with [`StoreError::Unavailable`]
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// No record stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop the record under `key`, returning whether one existed
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(index) => {
                self.records.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.records.iter().position(|(k, _)| k.as_str() == key)
    }
}

impl<const N: usize> CalibrationStore for MemoryStore<N> {
    fn read(&mut self, key: &str) -> StoreResult<Option<RecordText>> {
        Ok(self.position(key).map(|index| self.records[index].1.clone()))
    }

    fn write(&mut self, key: &str, text: &str) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::Unavailable);
        }

        let mut record = RecordText::new();
        record.push_str(text).map_err(|_| StoreError::Capacity)?;

        if let Some(index) = self.position(key) {
            self.records[index].1 = record;
            return Ok(());
        }

        let mut owned_key = String::new();
        owned_key.push_str(key).map_err(|_| StoreError::Capacity)?;
        self.records
            .push((owned_key, record))
            .map_err(|_| StoreError::Capacity)
    }
}
