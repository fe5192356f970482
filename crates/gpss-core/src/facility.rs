//! Facilities: single-server resources held by at most one transaction.

use crate::chain::{DelayChain, Parked};
use crate::fixed::{Fixed64, SimTime, ratio};
use crate::id::{EntityName, TransactionId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FacilityError {
    #[error("facility {0} is already owned")]
    Busy(EntityName),
    #[error("facility {0} seized again by the transaction that owns it")]
    AlreadyOwner(EntityName),
    #[error("facility {facility} released by a transaction that does not own it")]
    NotOwner { facility: EntityName },
}

/// A mutual-exclusion resource.
#[derive(Debug, Clone)]
pub struct Facility {
    name: EntityName,
    owner: Option<TransactionId>,
    seized_at: SimTime,
    preempted: bool,
    entry_count: u64,
    /// Busy time of completed ownerships.
    busy_time: SimTime,
    /// Transactions refused by SEIZE.
    pub delay_chain: DelayChain,
    /// Transactions displaced by preemption. Drained ahead of the delay
    /// chain on release.
    pub pending_chain: DelayChain,
}

impl Facility {
    pub fn new(name: EntityName) -> Self {
        Self {
            name,
            owner: None,
            seized_at: 0,
            preempted: false,
            entry_count: 0,
            busy_time: 0,
            delay_chain: DelayChain::new(),
            pending_chain: DelayChain::new(),
        }
    }

    pub fn name(&self) -> &EntityName {
        &self.name
    }

    pub fn owner(&self) -> Option<TransactionId> {
        self.owner
    }

    pub fn is_busy(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_preempted(&self) -> bool {
        self.preempted
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Take ownership for `tx`.
    pub fn seize(&mut self, tx: TransactionId, clock: SimTime) -> Result<(), FacilityError> {
        if self.owner.is_some() {
            return Err(FacilityError::Busy(self.name.clone()));
        }
        self.owner = Some(tx);
        self.seized_at = clock;
        self.entry_count += 1;
        Ok(())
    }

    /// Give up ownership. Only the owner may release.
    pub fn release(&mut self, tx: TransactionId, clock: SimTime) -> Result<(), FacilityError> {
        if self.owner != Some(tx) {
            return Err(FacilityError::NotOwner {
                facility: self.name.clone(),
            });
        }
        self.busy_time += clock - self.seized_at;
        self.owner = None;
        self.preempted = false;
        Ok(())
    }

    /// Next transaction to re-admit after a release: the pending chain is
    /// served before the delay chain.
    pub fn next_waiting(&mut self) -> Option<Parked> {
        self.pending_chain
            .pop_highest_priority()
            .or_else(|| self.delay_chain.pop_highest_priority())
    }

    /// Total busy time including the ownership in progress.
    pub fn busy_time(&self, clock: SimTime) -> SimTime {
        match self.owner {
            Some(_) => self.busy_time + (clock - self.seized_at),
            None => self.busy_time,
        }
    }

    /// Fraction of elapsed time the facility was owned.
    pub fn utilization(&self, clock: SimTime) -> Fixed64 {
        ratio(self.busy_time(clock), clock)
    }

    /// Mean ownership duration per entry.
    pub fn average_holding_time(&self, clock: SimTime) -> Fixed64 {
        ratio(self.busy_time(clock), self.entry_count as i64)
    }

    pub(crate) fn forget(&mut self, tx: TransactionId) -> bool {
        let delayed = self.delay_chain.remove(tx);
        let pending = self.pending_chain.remove(tx);
        delayed || pending
    }

    pub(crate) fn reset(&mut self) {
        *self = Facility::new(self.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn two_ids() -> (TransactionId, TransactionId) {
        let mut map: SlotMap<TransactionId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn seize_and_release() {
        let (a, _) = two_ids();
        let mut f = Facility::new("CAJA".into());
        f.seize(a, 10).unwrap();
        assert!(f.is_busy());
        assert_eq!(f.owner(), Some(a));
        f.release(a, 25).unwrap();
        assert!(!f.is_busy());
        assert_eq!(f.busy_time(100), 15);
        assert_eq!(f.entry_count(), 1);
    }

    #[test]
    fn second_seize_is_refused() {
        let (a, b) = two_ids();
        let mut f = Facility::new("CAJA".into());
        f.seize(a, 0).unwrap();
        assert_eq!(f.seize(b, 1), Err(FacilityError::Busy("CAJA".into())));
        assert_eq!(f.owner(), Some(a));
    }

    #[test]
    fn release_by_non_owner_fails() {
        let (a, b) = two_ids();
        let mut f = Facility::new(EntityName::Numbered(1));
        f.seize(a, 0).unwrap();
        assert!(matches!(f.release(b, 5), Err(FacilityError::NotOwner { .. })));
        assert!(f.is_busy());
    }

    #[test]
    fn release_of_idle_facility_fails() {
        let (a, _) = two_ids();
        let mut f = Facility::new("CAJA".into());
        assert!(f.release(a, 5).is_err());
    }

    #[test]
    fn utilization_counts_ownership_in_progress() {
        let (a, _) = two_ids();
        let mut f = Facility::new("CAJA".into());
        f.seize(a, 50).unwrap();
        assert_eq!(f.utilization(100), Fixed64::from_num(0.5));
        assert_eq!(f.average_holding_time(100), Fixed64::from_num(50));
    }

    #[test]
    fn statistics_are_zero_before_time_passes() {
        let f = Facility::new("CAJA".into());
        assert_eq!(f.utilization(0), Fixed64::ZERO);
        assert_eq!(f.average_holding_time(0), Fixed64::ZERO);
    }

    #[test]
    fn pending_chain_is_served_first() {
        let (a, b) = two_ids();
        let mut f = Facility::new("CAJA".into());
        f.delay_chain.push(Parked { tx: a, priority: 10, units: 1 });
        f.pending_chain.push(Parked { tx: b, priority: 0, units: 1 });
        assert_eq!(f.next_waiting().map(|p| p.tx), Some(b));
        assert_eq!(f.next_waiting().map(|p| p.tx), Some(a));
        assert!(f.next_waiting().is_none());
    }
}
