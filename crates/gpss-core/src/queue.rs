//! Queues: statistics-only entities. QUEUE and DEPART never block.

use crate::fixed::{Fixed64, SimTime, ratio_wide};
use crate::id::{EntityName, TransactionId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("transaction departs queue {queue} without having joined it")]
    NotQueued { queue: EntityName },
    #[error("departing {requested} units from queue {queue}, but the transaction holds {held}")]
    Underflow {
        queue: EntityName,
        requested: i64,
        held: i64,
    },
}

/// An open residence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueVisit {
    pub entered_at: SimTime,
    pub units: i64,
}

#[derive(Debug, Clone)]
pub struct Queue {
    name: EntityName,
    current_count: i64,
    entry_count: u64,
    zero_entry_count: u64,
    peak_count: i64,
    /// Sum of `units * stay` over closed visits.
    residence_time: i128,
    /// Integral of content over time, up to `last_change`.
    content_time: i128,
    last_change: SimTime,
    visits: HashMap<TransactionId, QueueVisit>,
}

impl Queue {
    pub fn new(name: EntityName) -> Self {
        Self {
            name,
            current_count: 0,
            entry_count: 0,
            zero_entry_count: 0,
            peak_count: 0,
            residence_time: 0,
            content_time: 0,
            last_change: 0,
            visits: HashMap::new(),
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn current_count(&self) -> i64 {
        self.current_count
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn zero_entry_count(&self) -> u64 {
        self.zero_entry_count
    }

    pub fn peak_count(&self) -> i64 {
        self.peak_count
    }

    pub fn residence_time(&self) -> i128 {
        self.residence_time
    }

    pub fn visit(&self, tx: TransactionId) -> Option<&QueueVisit> {
        self.visits.get(&tx)
    }

    fn accumulate(&mut self, clock: SimTime) {
        self.content_time += self.current_count as i128 * (clock - self.last_change) as i128;
        self.last_change = clock;
    }

    /// Add `units` of content on behalf of `tx`. Joining twice before
    /// departing adds to the open visit and keeps its entry time.
    pub fn join(&mut self, tx: TransactionId, units: i64, clock: SimTime) {
        self.accumulate(clock);
        self.current_count += units;
        self.entry_count += units as u64;
        self.peak_count = self.peak_count.max(self.current_count);
        self.visits
            .entry(tx)
            .and_modify(|v| v.units += units)
            .or_insert(QueueVisit {
                entered_at: clock,
                units,
            });
    }

    /// Remove `units` of `tx`'s content. Returns the time spent queued.
    pub fn depart(
        &mut self,
        tx: TransactionId,
        units: i64,
        clock: SimTime,
    ) -> Result<SimTime, QueueError> {
        let visit = *self.visits.get(&tx).ok_or_else(|| QueueError::NotQueued {
            queue: self.name.clone(),
        })?;
        if units > visit.units {
            return Err(QueueError::Underflow {
                queue: self.name.clone(),
                requested: units,
                held: visit.units,
            });
        }
        self.accumulate(clock);
        let stay = clock - visit.entered_at;
        self.current_count -= units;
        self.residence_time += units as i128 * stay as i128;
        if stay == 0 {
            self.zero_entry_count += units as u64;
        }
        if units == visit.units {
            self.visits.remove(&tx);
        } else if let Some(open) = self.visits.get_mut(&tx) {
            open.units -= units;
        }
        Ok(stay)
    }

    /// Drop `tx`'s open visit without a departure. Returns whether it had
    /// one.
    pub(crate) fn abandon(&mut self, tx: TransactionId) -> bool {
        self.visits.remove(&tx).is_some()
    }

    /// Transactions with an open visit.
    pub fn open_visits(&self) -> usize {
        self.visits.len()
    }

    fn integral(&self, clock: SimTime) -> i128 {
        self.content_time + self.current_count as i128 * (clock - self.last_change) as i128
    }

    /// Time-weighted mean content.
    pub fn average_content(&self, clock: SimTime) -> Fixed64 {
        ratio_wide(self.integral(clock), clock as i128)
    }

    /// Mean time per unit of content, counting units still queued up to
    /// `clock`.
    pub fn average_residence(&self, clock: SimTime) -> Fixed64 {
        ratio_wide(self.integral(clock), self.entry_count as i128)
    }

    /// Mean time per unit, excluding units that left with zero wait.
    pub fn average_residence_nonzero(&self, clock: SimTime) -> Fixed64 {
        let nonzero = self.entry_count.saturating_sub(self.zero_entry_count);
        ratio_wide(self.integral(clock), nonzero as i128)
    }

    pub(crate) fn reset(&mut self) {
        *self = Queue::new(self.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<TransactionId> {
        let mut map: SlotMap<TransactionId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn join_and_depart() {
        let t = ids(2);
        let mut q = Queue::new("COLA".into());
        q.join(t[0], 1, 0);
        q.join(t[1], 1, 5);
        assert_eq!(q.current_count(), 2);
        assert_eq!(q.peak_count(), 2);
        assert_eq!(q.depart(t[0], 1, 10).unwrap(), 10);
        assert_eq!(q.current_count(), 1);
        assert_eq!(q.entry_count(), 2);
        assert_eq!(q.zero_entry_count(), 0);
        assert_eq!(q.residence_time(), 10);
    }

    #[test]
    fn zero_wait_is_counted() {
        let t = ids(1);
        let mut q = Queue::new("COLA".into());
        q.join(t[0], 1, 7);
        assert_eq!(q.depart(t[0], 1, 7).unwrap(), 0);
        assert_eq!(q.zero_entry_count(), 1);
    }

    #[test]
    fn depart_without_join_fails() {
        let t = ids(1);
        let mut q = Queue::new("COLA".into());
        assert!(matches!(q.depart(t[0], 1, 0), Err(QueueError::NotQueued { .. })));
    }

    #[test]
    fn depart_more_units_than_held_fails() {
        let t = ids(1);
        let mut q = Queue::new("COLA".into());
        q.join(t[0], 2, 0);
        assert!(matches!(
            q.depart(t[0], 3, 1),
            Err(QueueError::Underflow { held: 2, .. })
        ));
        assert_eq!(q.current_count(), 2);
    }

    #[test]
    fn partial_depart_keeps_visit_open() {
        let t = ids(1);
        let mut q = Queue::new("COLA".into());
        q.join(t[0], 3, 0);
        q.depart(t[0], 1, 4).unwrap();
        assert_eq!(q.visit(t[0]).map(|v| v.units), Some(2));
        q.depart(t[0], 2, 6).unwrap();
        assert!(q.visit(t[0]).is_none());
        assert_eq!(q.current_count(), 0);
    }

    #[test]
    fn averages() {
        let t = ids(2);
        let mut q = Queue::new("COLA".into());
        // One unit queued from 0 to 10, a second with zero wait at 10.
        q.join(t[0], 1, 0);
        q.depart(t[0], 1, 10).unwrap();
        q.join(t[1], 1, 10);
        q.depart(t[1], 1, 10).unwrap();
        assert_eq!(q.average_content(20), Fixed64::from_num(0.5));
        assert_eq!(q.average_residence(20), Fixed64::from_num(5));
        assert_eq!(q.average_residence_nonzero(20), Fixed64::from_num(10));
    }

    #[test]
    fn averages_are_zero_without_entries() {
        let q = Queue::new("COLA".into());
        assert_eq!(q.average_content(0), Fixed64::ZERO);
        assert_eq!(q.average_residence(0), Fixed64::ZERO);
        assert_eq!(q.average_residence_nonzero(0), Fixed64::ZERO);
    }
}
