//! Block execution: what happens when a transaction tries to enter a block.
//!
//! Each kind has a `process_*` function. They decide whether the entry is
//! admitted and apply the block's own effects. The bookkeeping every
//! admitted entry shares (residency, `current_block`, entry counts) is done
//! by the engine once `process` reports [`BlockOutcome::Processed`].

use crate::block::{AssignTarget, Block, BlockCounters, BlockKind};
use crate::chain::Parked;
use crate::facility::FacilityError;
use crate::fixed::{Fixed64, SimTime};
use crate::id::{BlockId, EntityName, TransactionId};
use crate::operand::{AttributeSource, Operand, OperandError, Sna};
use crate::queue::QueueError;
use crate::registry::Registry;
use crate::rng::{RandomSource, SPREAD_FAMILY};
use crate::scheduler::Scheduler;
use crate::storage::{DEFAULT_STORAGE_CAPACITY, StorageError};
use crate::transaction::{Transaction, TransactionState};
use std::collections::HashMap;

/// Deepest chain of `FN$` references evaluated before giving up.
pub const MAX_FUNCTION_DEPTH: usize = 16;

// ---------------------------------------------------------------------------
// Outcomes and faults
// ---------------------------------------------------------------------------

/// Result of a successful entry attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Processed,
    /// The block is blocked; the transaction was parked and will retry.
    EntryRefused,
}

/// A runtime error that discards the transaction that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessFault {
    #[error("time {time} is before the clock ({clock})")]
    TimeBeforeClock { time: SimTime, clock: SimTime },
    #[error("spread must not be negative, got {0}")]
    NegativeSpread(i64),
    #[error("termination amount must not be negative, got {0}")]
    NegativeTermination(i64),
    #[error("unit count must be positive, got {0}")]
    InvalidUnits(i64),
    #[error(transparent)]
    Facility(#[from] FacilityError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Operand(#[from] OperandError),
    #[error("transaction tried to enter GENERATE block {0}")]
    EnteredGenerate(u32),
    #[error("block {0} is a declaration and cannot be entered")]
    NotExecutable(u32),
    #[error("transaction ran past the last block")]
    EndOfChain,
}

/// One entry of the fault log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub clock: SimTime,
    pub block: Option<BlockId>,
    pub block_number: Option<u32>,
    /// Number of the discarded transaction; `None` for GENERATE faults.
    pub transaction: Option<u64>,
    pub fault: ProcessFault,
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a block can touch while processing an entry.
pub(crate) struct ProcessContext<'a> {
    pub blocks: &'a [Block],
    pub counters: &'a mut [BlockCounters],
    pub labels: &'a HashMap<String, BlockId>,
    pub registry: &'a mut Registry,
    pub scheduler: &'a mut Scheduler,
    pub rng: &'a mut RandomSource,
    pub depth: usize,
}

impl ProcessContext<'_> {
    fn clock(&self) -> SimTime {
        self.scheduler.clock
    }

    fn label(&self, label: &str) -> Result<BlockId, OperandError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| OperandError::UnknownLabel(label.to_string()))
    }

    /// Value of function `name` for `tx`.
    pub fn function_value(
        &mut self,
        name: &EntityName,
        tx: Option<TransactionId>,
    ) -> Result<i64, OperandError> {
        if self.depth >= MAX_FUNCTION_DEPTH {
            return Err(OperandError::RecursionLimit(MAX_FUNCTION_DEPTH));
        }
        let argument = self
            .registry
            .function(name)
            .ok_or_else(|| OperandError::UnknownFunction(name.clone()))?
            .argument()
            .clone();
        self.depth += 1;
        let x = argument.value(tx, self);
        self.depth -= 1;
        let x = x?;
        self.registry
            .function(name)
            .map(|f| f.evaluate(x))
            .ok_or_else(|| OperandError::UnknownFunction(name.clone()))
    }

    /// Put a parked transaction back on the CEC.
    fn wake(&mut self, tx: TransactionId) {
        if let Some(t) = self.scheduler.transaction_mut(tx) {
            t.is_delayed = false;
            t.is_preempted = false;
        }
        self.scheduler.insert_cec(tx);
    }

    /// Take `tx` off the CEC and leave it waiting on a resource.
    fn park(&mut self, tx: TransactionId) {
        if let Some(t) = self.scheduler.transaction_mut(tx) {
            t.state = TransactionState::Passive;
            t.is_delayed = true;
        }
        self.scheduler.remove_cec(tx);
    }

    /// The transaction a transaction-scoped SNA reads.
    fn acting(&self, sna: &Sna, tx: Option<TransactionId>) -> Result<&Transaction, OperandError> {
        tx.and_then(|id| self.scheduler.transaction(id))
            .ok_or_else(|| OperandError::NoTransaction(sna.to_string()))
    }

    fn priority(&self, tx: TransactionId) -> i64 {
        self.scheduler.transaction(tx).map_or(0, |t| t.priority)
    }
}

impl AttributeSource for ProcessContext<'_> {
    fn parameter(&self, tx: TransactionId, name: &str) -> Option<i64> {
        self.scheduler.transaction(tx).map(|t| t.parameter(name))
    }

    fn attribute(&mut self, sna: &Sna, tx: Option<TransactionId>) -> Result<i64, OperandError> {
        let clock = self.clock();
        let value = match sna {
            Sna::Clock | Sna::AbsoluteClock => clock,
            Sna::TransactionNumber => self.acting(sna, tx)?.number() as i64,
            Sna::Priority => self.acting(sna, tx)?.priority,
            Sna::TransitTime => self.acting(sna, tx)?.transit_time(clock),
            Sna::TerminationCount => self.scheduler.termination_count,
            Sna::Random(family) => self.rng.draw(*family),
            Sna::BlockEntries(label) => self.counters[self.label(label)?.index()].entry_count as i64,
            Sna::BlockCurrent(label) => {
                self.counters[self.label(label)?.index()].current_count() as i64
            }
            Sna::FacilityBusy(name) => self
                .registry
                .facility(name)
                .map_or(0, |f| f.is_busy() as i64),
            Sna::FacilityEntries(name) => self
                .registry
                .facility(name)
                .map_or(0, |f| f.entry_count() as i64),
            Sna::FacilityUtilization(name) => self.registry.facility(name).map_or(0, |f| {
                (f.utilization(clock) * Fixed64::from_num(1000)).to_num::<i64>()
            }),
            Sna::StorageInUse(name) => self.registry.storage(name).map_or(0, |s| s.in_use()),
            Sna::StorageRemaining(name) => self
                .registry
                .storage(name)
                .map_or(DEFAULT_STORAGE_CAPACITY, |s| s.free_units()),
            Sna::StorageEntries(name) => self
                .registry
                .storage(name)
                .map_or(0, |s| s.entry_count() as i64),
            Sna::StorageMax(name) => self.registry.storage(name).map_or(0, |s| s.peak_in_use()),
            Sna::QueueContent(name) => self.registry.queue(name).map_or(0, |q| q.current_count()),
            Sna::QueueMax(name) => self.registry.queue(name).map_or(0, |q| q.peak_count()),
            Sna::QueueEntries(name) => self
                .registry
                .queue(name)
                .map_or(0, |q| q.entry_count() as i64),
            Sna::Function(name) => return self.function_value(name, tx),
        };
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Ask GENERATE block `id` for its next transaction. Returns `None` once the
/// block's limit is reached.
pub(crate) fn admit(
    ctx: &mut ProcessContext<'_>,
    id: BlockId,
) -> Result<Option<TransactionId>, ProcessFault> {
    let blocks = ctx.blocks;
    let block = &blocks[id.index()];
    let BlockKind::Generate {
        mean,
        spread,
        offset,
        limit,
        priority,
    } = &block.kind
    else {
        return Err(ProcessFault::NotExecutable(block.number));
    };

    let admissions = ctx.counters[id.index()].admissions;
    let limit = limit.value(None, ctx)?;
    if limit > 0 && admissions >= limit as u64 {
        return Ok(None);
    }

    let clock = ctx.clock();
    let offset = if admissions == 0 {
        offset.value(None, ctx)?
    } else {
        0
    };
    let mean = mean.value(None, ctx)?;
    let spread = spread.value(None, ctx)?;
    if spread < 0 {
        return Err(ProcessFault::NegativeSpread(spread));
    }
    let arrival = clock
        .saturating_add(offset)
        .saturating_add(mean)
        .saturating_add(ctx.rng.deviation(SPREAD_FAMILY, spread));
    if arrival < clock {
        return Err(ProcessFault::TimeBeforeClock {
            time: arrival,
            clock,
        });
    }
    let priority = priority.value(None, ctx)?;

    let tx = ctx.scheduler.create_transaction();
    if let Some(t) = ctx.scheduler.transaction_mut(tx) {
        t.current_block = Some(id);
        t.next_block = block.next;
        if priority > 0 {
            t.priority = priority;
        }
    }
    ctx.scheduler.insert_fec(tx, arrival);
    let counters = &mut ctx.counters[id.index()];
    counters.admissions += 1;
    counters.entry_count += 1;
    Ok(Some(tx))
}

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// Try to move `tx` into block `id`.
pub(crate) fn process(
    ctx: &mut ProcessContext<'_>,
    id: BlockId,
    tx: TransactionId,
) -> Result<BlockOutcome, ProcessFault> {
    let blocks = ctx.blocks;
    let block = &blocks[id.index()];
    let t = Some(tx);
    match &block.kind {
        BlockKind::Generate { .. } => Err(ProcessFault::EnteredGenerate(block.number)),
        BlockKind::Advance { mean, spread } => {
            let mean = mean.value(t, ctx)?;
            let spread = spread.value(t, ctx)?;
            process_advance(ctx, tx, mean, spread)
        }
        BlockKind::Terminate { amount } => {
            let amount = amount.value(t, ctx)?;
            process_terminate(ctx, tx, amount)
        }
        BlockKind::Seize { facility } => {
            let name = facility.entity(t, &*ctx)?;
            process_seize(ctx, tx, &name)
        }
        BlockKind::Release { facility } => {
            let name = facility.entity(t, &*ctx)?;
            process_release(ctx, tx, &name)
        }
        BlockKind::Enter { storage, units } => {
            let name = storage.entity(t, &*ctx)?;
            let units = positive_units(units.value(t, ctx)?)?;
            process_enter(ctx, tx, &name, units)
        }
        BlockKind::Leave { storage, units } => {
            let name = storage.entity(t, &*ctx)?;
            let units = positive_units(units.value(t, ctx)?)?;
            process_leave(ctx, tx, &name, units)
        }
        BlockKind::Queue { queue, units } => {
            let name = queue.entity(t, &*ctx)?;
            let units = positive_units(units.value(t, ctx)?)?;
            let clock = ctx.clock();
            ctx.registry.queue_mut(&name).join(tx, units, clock);
            Ok(BlockOutcome::Processed)
        }
        BlockKind::Depart { queue, units } => {
            let name = queue.entity(t, &*ctx)?;
            let units = positive_units(units.value(t, ctx)?)?;
            let clock = ctx.clock();
            ctx.registry.queue_mut(&name).depart(tx, units, clock)?;
            Ok(BlockOutcome::Processed)
        }
        BlockKind::Priority { value } => {
            let value = value.value(t, ctx)?;
            if let Some(t) = ctx.scheduler.transaction_mut(tx) {
                t.priority = value;
            }
            Ok(BlockOutcome::Processed)
        }
        BlockKind::Assign {
            target,
            value,
            function,
        } => process_assign(ctx, tx, target, value, function.as_ref()),
        BlockKind::Trace | BlockKind::Untrace => {
            let on = matches!(block.kind, BlockKind::Trace);
            if let Some(t) = ctx.scheduler.transaction_mut(tx) {
                t.trace_enabled = on;
            }
            Ok(BlockOutcome::Processed)
        }
        BlockKind::Storage { .. } | BlockKind::Function { .. } => {
            Err(ProcessFault::NotExecutable(block.number))
        }
    }
}

fn positive_units(units: i64) -> Result<i64, ProcessFault> {
    if units <= 0 {
        return Err(ProcessFault::InvalidUnits(units));
    }
    Ok(units)
}

fn process_advance(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    mean: i64,
    spread: i64,
) -> Result<BlockOutcome, ProcessFault> {
    if spread < 0 {
        return Err(ProcessFault::NegativeSpread(spread));
    }
    let clock = ctx.clock();
    let next = clock
        .saturating_add(mean)
        .saturating_add(ctx.rng.deviation(SPREAD_FAMILY, spread));
    if next < clock {
        return Err(ProcessFault::TimeBeforeClock { time: next, clock });
    }
    if let Some(t) = ctx.scheduler.transaction_mut(tx) {
        t.state = TransactionState::Passive;
        t.is_scan_exempt = true;
    }
    ctx.scheduler.remove_cec(tx);
    ctx.scheduler.insert_fec(tx, next);
    Ok(BlockOutcome::Processed)
}

fn process_terminate(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    amount: i64,
) -> Result<BlockOutcome, ProcessFault> {
    if amount < 0 {
        return Err(ProcessFault::NegativeTermination(amount));
    }
    ctx.scheduler.termination_count -= amount;
    if let Some(t) = ctx.scheduler.transaction_mut(tx) {
        t.state = TransactionState::Terminated;
    }
    ctx.scheduler.remove_cec(tx);
    Ok(BlockOutcome::Processed)
}

fn process_seize(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    name: &EntityName,
) -> Result<BlockOutcome, ProcessFault> {
    let clock = ctx.clock();
    let priority = ctx.priority(tx);
    let facility = ctx.registry.facility_mut(name);
    if facility.owner() == Some(tx) {
        return Err(FacilityError::AlreadyOwner(name.clone()).into());
    }
    if facility.is_busy() {
        facility.delay_chain.push(Parked {
            tx,
            priority,
            units: 1,
        });
        ctx.park(tx);
        return Ok(BlockOutcome::EntryRefused);
    }
    facility.seize(tx, clock)?;
    facility.delay_chain.admitted(tx);
    facility.pending_chain.admitted(tx);
    Ok(BlockOutcome::Processed)
}

fn process_release(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    name: &EntityName,
) -> Result<BlockOutcome, ProcessFault> {
    let clock = ctx.clock();
    let facility = ctx.registry.facility_mut(name);
    facility.release(tx, clock)?;
    if let Some(parked) = facility.next_waiting() {
        ctx.wake(parked.tx);
    }
    Ok(BlockOutcome::Processed)
}

fn process_enter(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    name: &EntityName,
    units: i64,
) -> Result<BlockOutcome, ProcessFault> {
    let clock = ctx.clock();
    let priority = ctx.priority(tx);
    let storage = ctx.registry.storage_mut(name);
    if units > storage.capacity() {
        return Err(StorageError::ExceedsCapacity {
            storage: name.clone(),
            requested: units,
            capacity: storage.capacity(),
        }
        .into());
    }
    if !storage.can_enter(units) {
        storage.delay_chain.push(Parked {
            tx,
            priority,
            units,
        });
        ctx.park(tx);
        return Ok(BlockOutcome::EntryRefused);
    }
    storage.enter(units, clock)?;
    storage.delay_chain.admitted(tx);
    Ok(BlockOutcome::Processed)
}

fn process_leave(
    ctx: &mut ProcessContext<'_>,
    _tx: TransactionId,
    name: &EntityName,
    units: i64,
) -> Result<BlockOutcome, ProcessFault> {
    let clock = ctx.clock();
    let storage = ctx.registry.storage_mut(name);
    storage.leave(units, clock)?;

    // Wake waiters in priority order while their requests fit in the units
    // not yet promised to an earlier wakee.
    let mut budget = storage.free_units();
    let mut woken = Vec::new();
    while let Some(next) = storage.delay_chain.peek_highest_priority() {
        if next.units > budget {
            break;
        }
        budget -= next.units;
        if let Some(parked) = storage.delay_chain.pop_highest_priority() {
            woken.push(parked.tx);
        }
    }
    for tx in woken {
        ctx.wake(tx);
    }
    Ok(BlockOutcome::Processed)
}

fn process_assign(
    ctx: &mut ProcessContext<'_>,
    tx: TransactionId,
    target: &AssignTarget,
    value: &Operand,
    function: Option<&Operand>,
) -> Result<BlockOutcome, ProcessFault> {
    let t = Some(tx);
    let mut value = value.value(t, ctx)?;
    if let Some(function) = function {
        let name = function.entity(t, &*ctx)?;
        value = value.saturating_mul(ctx.function_value(&name, t)?);
    }
    if let Some(t) = ctx.scheduler.transaction_mut(tx) {
        let current = t.parameter(&target.name);
        t.set_parameter(&target.name, target.apply(current, value));
    }
    Ok(BlockOutcome::Processed)
}
