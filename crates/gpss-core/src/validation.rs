//! Kernel invariant checks.
//!
//! Cheap enough to run between [`Simulation::step`] calls in tests; nothing
//! here is needed for a normal run.

use crate::engine::Simulation;
use crate::fixed::SimTime;
use crate::id::{EntityName, TransactionId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("transaction {transaction} is on {chains} chains")]
    ChainMembership { transaction: u64, chains: usize },
    #[error("a chain holds a transaction that no longer exists")]
    DanglingMember,
    #[error("future events chain is out of order at position {0}")]
    FecOrder(usize),
    #[error("future event at {time} is behind the clock ({clock})")]
    FecBehindClock { time: SimTime, clock: SimTime },
    #[error("storage {storage} has {free} free units of {capacity}")]
    StorageBounds {
        storage: EntityName,
        free: i64,
        capacity: i64,
    },
    #[error("facility {0} is owned by a transaction waiting for it")]
    OwnerWaiting(EntityName),
    #[error("queue {0} has negative content")]
    NegativeQueue(EntityName),
}

/// Check every kernel invariant. Returns all violations found.
pub fn check_invariants(sim: &Simulation) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();
    let clock = sim.clock();

    let mut membership: HashMap<TransactionId, usize> = HashMap::new();
    let mut count = |tx: TransactionId| *membership.entry(tx).or_insert(0) += 1;

    let mut previous = SimTime::MIN;
    for (pos, (time, tx)) in sim.fec().enumerate() {
        if time < previous {
            violations.push(InvariantViolation::FecOrder(pos));
        }
        if time < clock {
            violations.push(InvariantViolation::FecBehindClock { time, clock });
        }
        previous = time;
        count(tx);
    }
    sim.cec().for_each(&mut count);

    for facility in sim.registry().facilities() {
        for parked in facility.delay_chain.iter().chain(facility.pending_chain.iter()) {
            count(parked.tx);
            if facility.owner() == Some(parked.tx) {
                violations.push(InvariantViolation::OwnerWaiting(facility.name().clone()));
            }
        }
    }
    for storage in sim.registry().storages() {
        storage.delay_chain.iter().for_each(|p| count(p.tx));
        let free = storage.free_units();
        if free < 0 || free > storage.capacity() {
            violations.push(InvariantViolation::StorageBounds {
                storage: storage.name().clone(),
                free,
                capacity: storage.capacity(),
            });
        }
    }
    for queue in sim.registry().queues() {
        if queue.current_count() < 0 {
            violations.push(InvariantViolation::NegativeQueue(queue.name().clone()));
        }
    }

    for (id, t) in sim.transactions() {
        let chains = membership.remove(&id).unwrap_or(0);
        if chains != 1 {
            violations.push(InvariantViolation::ChainMembership {
                transaction: t.number(),
                chains,
            });
        }
    }
    if !membership.is_empty() {
        violations.push(InvariantViolation::DanglingMember);
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
