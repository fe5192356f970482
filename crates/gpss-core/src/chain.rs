//! Transaction chains: the future events chain, the current events chain,
//! and the delay/pending chains resources park refused transactions on.
//!
//! Every chain preserves insertion order among equals. Priority selection is
//! a linear scan where the first member of the highest priority wins.

use crate::fixed::SimTime;
use crate::id::TransactionId;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Future events chain
// ---------------------------------------------------------------------------

/// Transactions waiting for a specific future clock time, kept sorted by
/// time. A transaction inserted at time `t` goes after every member already
/// scheduled at `t`.
#[derive(Debug, Clone, Default)]
pub struct FutureEventChain {
    entries: Vec<(SimTime, TransactionId)>,
}

impl FutureEventChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, time: SimTime, tx: TransactionId) {
        let at = self.entries.partition_point(|(t, _)| *t <= time);
        self.entries.insert(at, (time, tx));
    }

    /// Remove a transaction wherever it is. Returns whether it was present.
    pub fn remove(&mut self, tx: TransactionId) -> bool {
        match self.entries.iter().position(|(_, id)| *id == tx) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Earliest scheduled time, if any.
    pub fn next_time(&self) -> Option<SimTime> {
        self.entries.first().map(|(t, _)| *t)
    }

    /// Remove the head together with every member sharing its time, in
    /// chain order.
    pub fn pop_due(&mut self) -> Option<(SimTime, Vec<TransactionId>)> {
        let time = self.next_time()?;
        let end = self.entries.partition_point(|(t, _)| *t <= time);
        let due = self.entries.drain(..end).map(|(_, id)| id).collect();
        Some((time, due))
    }

    pub fn contains(&self, tx: TransactionId) -> bool {
        self.entries.iter().any(|(_, id)| *id == tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SimTime, TransactionId)> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Current events chain
// ---------------------------------------------------------------------------

/// Transactions eligible to run at the current clock, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CurrentEventChain {
    entries: Vec<TransactionId>,
}

impl CurrentEventChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: TransactionId) {
        self.entries.push(tx);
    }

    pub fn remove(&mut self, tx: TransactionId) -> bool {
        match self.entries.iter().position(|id| *id == tx) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Pick the first member of the highest priority among those for which
    /// `eligible` returns a priority.
    pub fn select<F>(&self, mut eligible: F) -> Option<TransactionId>
    where
        F: FnMut(TransactionId) -> Option<i64>,
    {
        let mut best: Option<(i64, TransactionId)> = None;
        for &id in &self.entries {
            if let Some(priority) = eligible(id) {
                match best {
                    Some((p, _)) if p >= priority => {}
                    _ => best = Some((priority, id)),
                }
            }
        }
        best.map(|(_, id)| id)
    }

    pub fn contains(&self, tx: TransactionId) -> bool {
        self.entries.contains(&tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Delay / pending chains
// ---------------------------------------------------------------------------

/// A transaction parked on a resource, with what it asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parked {
    pub tx: TransactionId,
    /// Priority at the moment of parking. Transactions cannot change
    /// priority while parked.
    pub priority: i64,
    /// Units requested (always 1 for facilities).
    pub units: i64,
}

/// A resource's waiting list.
///
/// Members are kept in arrival order. A transaction woken from the chain
/// that is refused again before it gets in (another CEC member took the
/// resource first) goes back to its old place, not to the tail.
#[derive(Debug, Clone, Default)]
pub struct DelayChain {
    /// `(arrival order, member)`, sorted by arrival order.
    entries: Vec<(u64, Parked)>,
    /// Arrival order of members woken but not yet admitted.
    woken: HashMap<TransactionId, u64>,
    next_order: u64,
}

impl DelayChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parked: Parked) {
        let order = match self.woken.remove(&parked.tx) {
            Some(order) => order,
            None => {
                let order = self.next_order;
                self.next_order += 1;
                order
            }
        };
        let pos = self.entries.partition_point(|(o, _)| *o < order);
        self.entries.insert(pos, (order, parked));
    }

    fn highest_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, (_, entry)) in self.entries.iter().enumerate() {
            match best {
                Some(b) if self.entries[b].1.priority >= entry.priority => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn peek_highest_priority(&self) -> Option<&Parked> {
        self.highest_index().map(|i| &self.entries[i].1)
    }

    /// Take the member to wake next. Its place is held until it is
    /// [`admitted`](Self::admitted) or removed.
    pub fn pop_highest_priority(&mut self) -> Option<Parked> {
        let i = self.highest_index()?;
        let (order, parked) = self.entries.remove(i);
        self.woken.insert(parked.tx, order);
        Some(parked)
    }

    /// `tx` got the resource; forget its held place.
    pub fn admitted(&mut self, tx: TransactionId) {
        self.woken.remove(&tx);
    }

    pub fn remove(&mut self, tx: TransactionId) -> bool {
        self.woken.remove(&tx);
        match self.entries.iter().position(|(_, p)| p.tx == tx) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, tx: TransactionId) -> bool {
        self.entries.iter().any(|(_, p)| p.tx == tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parked> {
        self.entries.iter().map(|(_, p)| p)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.woken.clear();
        self.next_order = 0;
    }
}
