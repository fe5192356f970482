//! The scheduler: transaction arena, clock and the two event chains.
//!
//! Chain membership and transaction state move together here, so that a
//! transaction on the FEC or CEC is always `Waiting` (or `Active`, for the
//! CEC member currently moving).

use crate::chain::{CurrentEventChain, FutureEventChain};
use crate::fixed::SimTime;
use crate::id::TransactionId;
use crate::sim::{RunState, StopReason};
use crate::transaction::{Transaction, TransactionState};
use slotmap::SlotMap;

#[derive(Debug, Clone)]
pub struct Scheduler {
    pub(crate) transactions: SlotMap<TransactionId, Transaction>,
    pub(crate) fec: FutureEventChain,
    pub(crate) cec: CurrentEventChain,
    pub(crate) clock: SimTime,
    pub(crate) target_time: SimTime,
    pub(crate) termination_count: i64,
    /// Transactions created so far; also the number of the newest one.
    pub(crate) transaction_counter: u64,
    pub(crate) active: Option<TransactionId>,
    pub(crate) state: RunState,
    pub(crate) stop_reason: Option<StopReason>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            transactions: SlotMap::with_key(),
            fec: FutureEventChain::new(),
            cec: CurrentEventChain::new(),
            clock: 0,
            target_time: SimTime::MAX,
            termination_count: 0,
            transaction_counter: 0,
            active: None,
            state: RunState::Idle,
            stop_reason: None,
        }
    }

    /// Back to time zero with no transactions.
    pub(crate) fn reset(&mut self, termination_count: i64, target_time: SimTime) {
        self.transactions.clear();
        self.fec.clear();
        self.cec.clear();
        self.clock = 0;
        self.target_time = target_time;
        self.termination_count = termination_count;
        self.transaction_counter = 0;
        self.active = None;
        self.state = RunState::Idle;
        self.stop_reason = None;
    }

    pub(crate) fn create_transaction(&mut self) -> TransactionId {
        self.transaction_counter += 1;
        self.transactions
            .insert(Transaction::new(self.transaction_counter, self.clock))
    }

    pub fn transaction(&self, tx: TransactionId) -> Option<&Transaction> {
        self.transactions.get(tx)
    }

    pub(crate) fn transaction_mut(&mut self, tx: TransactionId) -> Option<&mut Transaction> {
        self.transactions.get_mut(tx)
    }

    pub fn is_active(&self, tx: TransactionId) -> bool {
        self.transactions.get(tx).is_some_and(Transaction::is_active)
    }

    // -----------------------------------------------------------------------
    // Chain operations
    // -----------------------------------------------------------------------

    /// Schedule `tx` to leave the FEC at `time`.
    pub(crate) fn insert_fec(&mut self, tx: TransactionId, time: SimTime) {
        if let Some(t) = self.transactions.get_mut(tx) {
            t.state = TransactionState::Waiting;
            t.next_system_time = time;
        }
        self.fec.insert(time, tx);
    }

    /// Append `tx` to the CEC at the current clock.
    pub(crate) fn insert_cec(&mut self, tx: TransactionId) {
        if let Some(t) = self.transactions.get_mut(tx) {
            t.state = TransactionState::Waiting;
            t.next_system_time = self.clock;
            t.is_scan_exempt = false;
        }
        self.cec.push(tx);
    }

    pub(crate) fn remove_cec(&mut self, tx: TransactionId) -> bool {
        self.cec.remove(tx)
    }

    /// Highest-priority waiting CEC member, first in chain order on ties.
    pub(crate) fn select_waiting(&self, exclude: Option<TransactionId>) -> Option<TransactionId> {
        self.cec.select(|id| {
            if Some(id) == exclude {
                return None;
            }
            self.transactions
                .get(id)
                .filter(|t| t.state == TransactionState::Waiting)
                .map(|t| t.priority)
        })
    }

    pub(crate) fn activate(&mut self, tx: TransactionId) {
        if let Some(t) = self.transactions.get_mut(tx) {
            t.state = TransactionState::Active;
        }
        self.active = Some(tx);
    }

    /// Move the earliest FEC time group to the CEC and set the clock to its
    /// time. Returns `false` when the FEC is empty.
    pub(crate) fn advance_clock(&mut self) -> bool {
        let Some((time, due)) = self.fec.pop_due() else {
            return false;
        };
        debug_assert!(time >= self.clock, "FEC time {time} behind clock {}", self.clock);
        self.clock = self.clock.max(time);
        for tx in due {
            self.insert_cec(tx);
        }
        true
    }

    // -----------------------------------------------------------------------
    // Stop condition
    // -----------------------------------------------------------------------

    /// The reason the run should stop now, if any.
    pub(crate) fn stop_reason_now(&self) -> Option<StopReason> {
        if self.termination_count <= 0 {
            Some(StopReason::TerminationCount)
        } else if self.clock > self.target_time {
            Some(StopReason::TargetTime)
        } else {
            None
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.stop_reason_now().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transactions_are_numbered_in_creation_order() {
        let mut s = Scheduler::new();
        let a = s.create_transaction();
        let b = s.create_transaction();
        assert_eq!(s.transaction(a).unwrap().number(), 1);
        assert_eq!(s.transaction(b).unwrap().number(), 2);
        assert_eq!(s.transaction_counter, 2);
    }

    #[test]
    fn advance_clock_moves_whole_time_group() {
        let mut s = Scheduler::new();
        let a = s.create_transaction();
        let b = s.create_transaction();
        let c = s.create_transaction();
        s.insert_fec(a, 10);
        s.insert_fec(b, 20);
        s.insert_fec(c, 10);
        assert!(s.advance_clock());
        assert_eq!(s.clock, 10);
        assert_eq!(s.cec.iter().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(s.fec.len(), 1);
    }

    #[test]
    fn advance_clock_on_empty_fec() {
        let mut s = Scheduler::new();
        assert!(!s.advance_clock());
        assert_eq!(s.clock, 0);
    }

    #[test]
    fn select_waiting_by_priority_and_exclusion() {
        let mut s = Scheduler::new();
        let a = s.create_transaction();
        let b = s.create_transaction();
        let c = s.create_transaction();
        s.transaction_mut(b).unwrap().priority = 5;
        s.transaction_mut(c).unwrap().priority = 5;
        for tx in [a, b, c] {
            s.insert_cec(tx);
        }
        assert_eq!(s.select_waiting(None), Some(b));
        assert_eq!(s.select_waiting(Some(b)), Some(c));
        s.activate(b);
        assert_eq!(s.select_waiting(None), Some(c));
    }

    #[test]
    fn stop_reasons() {
        let mut s = Scheduler::new();
        s.reset(1, 100);
        assert_eq!(s.stop_reason_now(), None);
        s.clock = 101;
        assert_eq!(s.stop_reason_now(), Some(StopReason::TargetTime));
        s.termination_count = 0;
        assert_eq!(s.stop_reason_now(), Some(StopReason::TerminationCount));
    }
}
