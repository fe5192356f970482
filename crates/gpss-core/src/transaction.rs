//! Transactions: the units of simulated work that flow through the block
//! chain.

use crate::fixed::SimTime;
use crate::id::{AssemblySet, BlockId};
use std::collections::BTreeMap;

/// Priority given to transactions whose GENERATE block sets none.
pub const DEFAULT_PRIORITY: i64 = 0;

/// Where a transaction is in its lifecycle.
///
/// `Waiting` is the holding state for FEC/CEC members that are not the
/// active transaction. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TransactionState {
    Active,
    Waiting,
    Passive,
    Terminated,
}

/// A simulated unit of work.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Creation-order number, assigned once.
    number: u64,
    pub priority: i64,
    pub state: TransactionState,
    pub current_block: Option<BlockId>,
    pub next_block: Option<BlockId>,
    /// Time at which the transaction leaves the FEC.
    pub next_system_time: SimTime,
    /// Clock value at creation, refreshed on leaving a GENERATE.
    pub mark_time: SimTime,
    pub parameters: BTreeMap<String, i64>,
    pub assembly_set: AssemblySet,
    /// Parked on a resource delay chain.
    pub is_delayed: bool,
    pub is_preempted: bool,
    /// Set by ADVANCE; cleared when the transaction reaches the CEC again.
    pub is_scan_exempt: bool,
    pub trace_enabled: bool,
    /// The GENERATE this transaction came from has already been asked for
    /// the next arrival.
    pub(crate) successor_scheduled: bool,
}

impl Transaction {
    pub(crate) fn new(number: u64, created_at: SimTime) -> Self {
        Self {
            number,
            priority: DEFAULT_PRIORITY,
            state: TransactionState::Waiting,
            current_block: None,
            next_block: None,
            next_system_time: created_at,
            mark_time: created_at,
            parameters: BTreeMap::new(),
            assembly_set: AssemblySet(number),
            is_delayed: false,
            is_preempted: false,
            is_scan_exempt: false,
            trace_enabled: false,
            successor_scheduled: false,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    /// Value of a parameter; parameters never assigned read as zero.
    pub fn parameter(&self, name: &str) -> i64 {
        self.parameters.get(name).copied().unwrap_or(0)
    }

    pub fn set_parameter(&mut self, name: &str, value: i64) {
        self.parameters.insert(name.to_string(), value);
    }

    /// Time spent in the model since the last mark (`M1`).
    pub fn transit_time(&self, clock: SimTime) -> SimTime {
        clock - self.mark_time
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    pub fn is_terminated(&self) -> bool {
        self.state == TransactionState::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transaction_defaults() {
        let tx = Transaction::new(3, 40);
        assert_eq!(tx.number(), 3);
        assert_eq!(tx.priority, DEFAULT_PRIORITY);
        assert_eq!(tx.state, TransactionState::Waiting);
        assert_eq!(tx.mark_time, 40);
        assert_eq!(tx.assembly_set, AssemblySet(3));
        assert!(tx.current_block.is_none());
        assert!(!tx.is_delayed);
    }

    #[test]
    fn unset_parameter_reads_zero() {
        let mut tx = Transaction::new(1, 0);
        assert_eq!(tx.parameter("TIPO"), 0);
        tx.set_parameter("TIPO", 4);
        assert_eq!(tx.parameter("TIPO"), 4);
    }

    #[test]
    fn transit_time_from_mark() {
        let mut tx = Transaction::new(1, 10);
        assert_eq!(tx.transit_time(25), 15);
        tx.mark_time = 20;
        assert_eq!(tx.transit_time(25), 5);
    }
}
