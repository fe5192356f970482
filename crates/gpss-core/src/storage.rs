//! Storages: multi-unit resources with a declared capacity.

use crate::chain::DelayChain;
use crate::fixed::{Fixed64, SimTime, ratio_wide};
use crate::id::EntityName;

/// Capacity given to a storage that is used without a STORAGE declaration.
pub const DEFAULT_STORAGE_CAPACITY: i64 = i32::MAX as i64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage {storage} has {free} free units, {requested} requested")]
    Insufficient {
        storage: EntityName,
        requested: i64,
        free: i64,
    },
    #[error("storage {storage} can never hold {requested} units (capacity {capacity})")]
    ExceedsCapacity {
        storage: EntityName,
        requested: i64,
        capacity: i64,
    },
    #[error("leaving {released} units would overflow storage {storage} (only {in_use} in use)")]
    Overflow {
        storage: EntityName,
        released: i64,
        in_use: i64,
    },
    #[error("storage capacity must be positive, got {0}")]
    InvalidCapacity(i64),
}

/// A capacity-limited resource.
///
/// Invariant: `0 <= free_units <= capacity`.
#[derive(Debug, Clone)]
pub struct Storage {
    name: EntityName,
    capacity: i64,
    free_units: i64,
    /// Units admitted over the run.
    entry_count: u64,
    peak_in_use: i64,
    /// Integral of units in use over time, up to `last_change`.
    busy_time: i128,
    last_change: SimTime,
    /// Transactions refused by ENTER, with the units they asked for.
    pub delay_chain: DelayChain,
}

impl Storage {
    pub fn new(name: EntityName, capacity: i64) -> Result<Self, StorageError> {
        if capacity <= 0 {
            return Err(StorageError::InvalidCapacity(capacity));
        }
        Ok(Self {
            name,
            capacity,
            free_units: capacity,
            entry_count: 0,
            peak_in_use: 0,
            busy_time: 0,
            last_change: 0,
            delay_chain: DelayChain::new(),
        })
    }

    /// A storage used without a declaration.
    pub fn undeclared(name: EntityName) -> Self {
        Self {
            name,
            capacity: DEFAULT_STORAGE_CAPACITY,
            free_units: DEFAULT_STORAGE_CAPACITY,
            entry_count: 0,
            peak_in_use: 0,
            busy_time: 0,
            last_change: 0,
            delay_chain: DelayChain::new(),
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn free_units(&self) -> i64 {
        self.free_units
    }

    pub fn in_use(&self) -> i64 {
        self.capacity - self.free_units
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn peak_in_use(&self) -> i64 {
        self.peak_in_use
    }

    pub fn can_enter(&self, units: i64) -> bool {
        self.free_units >= units
    }

    fn accumulate(&mut self, clock: SimTime) {
        self.busy_time += self.in_use() as i128 * (clock - self.last_change) as i128;
        self.last_change = clock;
    }

    /// Occupy `units`. Fails without side effects when they are not free.
    pub fn enter(&mut self, units: i64, clock: SimTime) -> Result<(), StorageError> {
        if units > self.capacity {
            return Err(StorageError::ExceedsCapacity {
                storage: self.name.clone(),
                requested: units,
                capacity: self.capacity,
            });
        }
        if !self.can_enter(units) {
            return Err(StorageError::Insufficient {
                storage: self.name.clone(),
                requested: units,
                free: self.free_units,
            });
        }
        self.accumulate(clock);
        self.free_units -= units;
        self.entry_count += units as u64;
        self.peak_in_use = self.peak_in_use.max(self.in_use());
        Ok(())
    }

    /// Return `units`. Fails without side effects if more units would be
    /// free than the capacity.
    pub fn leave(&mut self, units: i64, clock: SimTime) -> Result<(), StorageError> {
        if units > self.in_use() {
            return Err(StorageError::Overflow {
                storage: self.name.clone(),
                released: units,
                in_use: self.in_use(),
            });
        }
        self.accumulate(clock);
        self.free_units += units;
        Ok(())
    }

    fn integral(&self, clock: SimTime) -> i128 {
        self.busy_time + self.in_use() as i128 * (clock - self.last_change) as i128
    }

    /// Time-weighted mean number of units in use.
    pub fn average_content(&self, clock: SimTime) -> Fixed64 {
        ratio_wide(self.integral(clock), clock as i128)
    }

    /// Time-weighted fraction of capacity in use.
    pub fn utilization(&self, clock: SimTime) -> Fixed64 {
        ratio_wide(self.integral(clock), clock as i128 * self.capacity as i128)
    }

    /// Mean time each admitted unit spent in the storage.
    pub fn average_holding_time(&self, clock: SimTime) -> Fixed64 {
        ratio_wide(self.integral(clock), self.entry_count as i128)
    }

    pub(crate) fn reset(&mut self) {
        self.free_units = self.capacity;
        self.entry_count = 0;
        self.peak_in_use = 0;
        self.busy_time = 0;
        self.last_change = 0;
        self.delay_chain.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salon() -> Storage {
        Storage::new("SALON".into(), 10).unwrap()
    }

    #[test]
    fn enter_and_leave_track_free_units() {
        let mut s = salon();
        s.enter(3, 0).unwrap();
        assert_eq!(s.free_units(), 7);
        assert_eq!(s.in_use(), 3);
        s.leave(2, 5).unwrap();
        assert_eq!(s.free_units(), 9);
        assert_eq!(s.entry_count(), 3);
        assert_eq!(s.peak_in_use(), 3);
    }

    #[test]
    fn enter_beyond_free_units_is_refused_without_change() {
        let mut s = salon();
        s.enter(8, 0).unwrap();
        let err = s.enter(3, 1).unwrap_err();
        assert!(matches!(err, StorageError::Insufficient { free: 2, .. }));
        assert_eq!(s.free_units(), 2);
    }

    #[test]
    fn enter_beyond_capacity_is_distinct() {
        let mut s = salon();
        assert!(matches!(
            s.enter(11, 0),
            Err(StorageError::ExceedsCapacity { capacity: 10, .. })
        ));
    }

    #[test]
    fn leave_cannot_exceed_capacity() {
        let mut s = salon();
        s.enter(1, 0).unwrap();
        assert!(matches!(s.leave(2, 1), Err(StorageError::Overflow { .. })));
        assert_eq!(s.free_units(), 9);
    }

    #[test]
    fn invalid_capacity() {
        assert_eq!(
            Storage::new("X".into(), 0).unwrap_err(),
            StorageError::InvalidCapacity(0)
        );
    }

    #[test]
    fn time_weighted_statistics() {
        let mut s = salon();
        // 5 units in use from t=0 to t=10, then 0 until t=20.
        s.enter(5, 0).unwrap();
        s.leave(5, 10).unwrap();
        assert_eq!(s.average_content(20), Fixed64::from_num(2.5));
        assert_eq!(s.utilization(20), Fixed64::from_num(0.25));
        assert_eq!(s.average_holding_time(20), Fixed64::from_num(10));
    }

    #[test]
    fn statistics_zero_at_time_zero() {
        let s = salon();
        assert_eq!(s.average_content(0), Fixed64::ZERO);
        assert_eq!(s.utilization(0), Fixed64::ZERO);
        assert_eq!(s.average_holding_time(0), Fixed64::ZERO);
    }

    #[test]
    fn reset_restores_capacity() {
        let mut s = salon();
        s.enter(4, 0).unwrap();
        s.reset();
        assert_eq!(s.free_units(), 10);
        assert_eq!(s.entry_count(), 0);
    }
}
