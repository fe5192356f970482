//! Read-only query API for inspecting simulation state.
//!
//! Snapshot types are owned copies with no references into the engine, so
//! they can be handed to report writers or serialized directly.

use crate::engine::Simulation;
use crate::fixed::{Fixed64, SimTime};
use crate::id::TransactionId;
use crate::transaction::TransactionState;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSnapshot {
    pub number: u32,
    pub line: usize,
    pub label: Option<String>,
    pub operation: &'static str,
    pub entry_count: u64,
    /// Transactions currently in the block.
    pub current_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySnapshot {
    pub name: String,
    pub busy: bool,
    /// Number of the owning transaction.
    pub owner: Option<u64>,
    pub entry_count: u64,
    pub utilization: Fixed64,
    pub average_holding_time: Fixed64,
    pub delay_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSnapshot {
    pub name: String,
    pub capacity: i64,
    pub in_use: i64,
    pub free_units: i64,
    pub entry_count: u64,
    pub peak_in_use: i64,
    pub average_content: Fixed64,
    pub utilization: Fixed64,
    pub average_holding_time: Fixed64,
    pub delay_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub name: String,
    pub current_count: i64,
    pub peak_count: i64,
    pub entry_count: u64,
    pub zero_entry_count: u64,
    pub average_content: Fixed64,
    pub average_residence: Fixed64,
    pub average_residence_nonzero: Fixed64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSnapshot {
    pub number: u64,
    pub priority: i64,
    pub state: TransactionState,
    /// Number of the block the transaction is in.
    pub block: Option<u32>,
    pub next_system_time: SimTime,
    pub delayed: bool,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Simulation {
    /// Transactional blocks in model order.
    pub fn block_snapshots(&self) -> Vec<BlockSnapshot> {
        self.blocks()
            .iter()
            .filter(|b| b.executable())
            .map(|b| {
                let counters = self.counters(b.id);
                BlockSnapshot {
                    number: b.number,
                    line: b.line,
                    label: b.label.clone(),
                    operation: b.kind.operation(),
                    entry_count: counters.map_or(0, |c| c.entry_count),
                    current_count: counters.map_or(0, |c| c.current_count()),
                }
            })
            .collect()
    }

    pub fn facility_snapshots(&self) -> Vec<FacilitySnapshot> {
        let clock = self.clock();
        self.registry()
            .facilities()
            .map(|f| FacilitySnapshot {
                name: f.name().to_string(),
                busy: f.is_busy(),
                owner: f
                    .owner()
                    .and_then(|tx| self.transaction(tx))
                    .map(|t| t.number()),
                entry_count: f.entry_count(),
                utilization: f.utilization(clock),
                average_holding_time: f.average_holding_time(clock),
                delay_count: f.delay_chain.len(),
                pending_count: f.pending_chain.len(),
            })
            .collect()
    }

    pub fn storage_snapshots(&self) -> Vec<StorageSnapshot> {
        let clock = self.clock();
        self.registry()
            .storages()
            .map(|s| StorageSnapshot {
                name: s.name().to_string(),
                capacity: s.capacity(),
                in_use: s.in_use(),
                free_units: s.free_units(),
                entry_count: s.entry_count(),
                peak_in_use: s.peak_in_use(),
                average_content: s.average_content(clock),
                utilization: s.utilization(clock),
                average_holding_time: s.average_holding_time(clock),
                delay_count: s.delay_chain.len(),
            })
            .collect()
    }

    pub fn queue_snapshots(&self) -> Vec<QueueSnapshot> {
        let clock = self.clock();
        self.registry()
            .queues()
            .map(|q| QueueSnapshot {
                name: q.name().to_string(),
                current_count: q.current_count(),
                peak_count: q.peak_count(),
                entry_count: q.entry_count(),
                zero_entry_count: q.zero_entry_count(),
                average_content: q.average_content(clock),
                average_residence: q.average_residence(clock),
                average_residence_nonzero: q.average_residence_nonzero(clock),
            })
            .collect()
    }

    pub fn transaction_snapshot(&self, tx: TransactionId) -> Option<TransactionSnapshot> {
        let t = self.transaction(tx)?;
        Some(TransactionSnapshot {
            number: t.number(),
            priority: t.priority,
            state: t.state,
            block: t
                .current_block
                .and_then(|id| self.block(id))
                .map(|b| b.number),
            next_system_time: t.next_system_time,
            delayed: t.is_delayed,
        })
    }

    /// Live transactions ordered by number.
    pub fn transaction_snapshots(&self) -> Vec<TransactionSnapshot> {
        let mut out: Vec<_> = self
            .transactions()
            .filter_map(|(id, _)| self.transaction_snapshot(id))
            .collect();
        out.sort_by_key(|t| t.number);
        out
    }
}
