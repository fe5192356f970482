//! The simulation engine: owns a model and runs it.
//!
//! # Architecture
//!
//! The [`Simulation`] owns:
//! - the block arena and its per-block [`BlockCounters`]
//! - the entity [`Registry`]
//! - a [`Scheduler`] (transaction arena, clock, FEC and CEC)
//! - the family-keyed [`RandomSource`]
//! - the fault log
//!
//! # Run loop
//!
//! Each [`Simulation::step`] runs one clock instant:
//! 1. **Scan** -- activate CEC members in priority order and move each one
//!    through as many blocks as it can enter.
//! 2. **Advance** -- pop the next FEC time group onto the CEC and set the
//!    clock to its time.
//!
//! The run stops when the termination counter reaches zero, the clock
//! passes the target time, or nothing is left to schedule.

use crate::block::{Block, BlockCounters};
use crate::fixed::SimTime;
use crate::id::{BlockId, TransactionId};
use crate::model::Model;
use crate::process::{self, BlockOutcome, FaultRecord, ProcessContext, ProcessFault};
use crate::registry::Registry;
use crate::rng::RandomSource;
use crate::scheduler::Scheduler;
use crate::sim::{RunState, RunSummary, SimConfig, StopReason};
use crate::transaction::Transaction;
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    blocks: Vec<Block>,
    counters: Vec<BlockCounters>,
    labels: HashMap<String, BlockId>,
    registry: Registry,
    scheduler: Scheduler,
    rng: RandomSource,
    faults: Vec<FaultRecord>,
}

impl Simulation {
    pub fn new(model: Model, config: SimConfig) -> Self {
        let counters = vec![BlockCounters::default(); model.blocks.len()];
        let rng = RandomSource::new(config.seed);
        Self {
            config,
            blocks: model.blocks,
            counters,
            labels: model.labels,
            registry: model.registry,
            scheduler: Scheduler::new(),
            rng,
            faults: Vec::new(),
        }
    }

    fn context(&mut self) -> ProcessContext<'_> {
        ProcessContext {
            blocks: &self.blocks,
            counters: &mut self.counters,
            labels: &self.labels,
            registry: &mut self.registry,
            scheduler: &mut self.scheduler,
            rng: &mut self.rng,
            depth: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Run with the configured target time.
    pub fn run(&mut self) -> RunSummary {
        self.simulate(self.config.target_time)
    }

    /// Run from time zero until a stop condition holds.
    pub fn simulate(&mut self, target_time: Option<SimTime>) -> RunSummary {
        self.begin(target_time);
        while self.step() {}
        self.summary()
    }

    /// Reset every piece of run state and seed the FEC with one arrival per
    /// GENERATE block.
    pub fn begin(&mut self, target_time: Option<SimTime>) {
        self.scheduler.reset(
            self.config.termination_count,
            target_time.unwrap_or(SimTime::MAX),
        );
        self.counters.iter_mut().for_each(BlockCounters::reset);
        self.registry.reset();
        self.rng.reset();
        self.faults.clear();
        self.scheduler.state = RunState::Running;
        info!(
            blocks = self.blocks.len(),
            termination_count = self.config.termination_count,
            target_time = ?target_time,
            seed = self.config.seed,
            "simulation started"
        );

        let generators: Vec<BlockId> = self
            .blocks
            .iter()
            .filter(|b| b.kind.is_generate())
            .map(|b| b.id)
            .collect();
        for id in generators {
            self.admit(id);
        }
    }

    /// Process one clock instant. Returns `false` once the run is over.
    pub fn step(&mut self) -> bool {
        if self.scheduler.state != RunState::Running {
            return false;
        }

        let mut last = None;
        while !self.scheduler.should_stop() {
            match self.scheduler.active {
                Some(tx) if self.scheduler.is_active(tx) => {
                    self.move_transaction(tx);
                    last = Some(tx);
                }
                _ => match self.scheduler.select_waiting(last) {
                    Some(next) => self.scheduler.activate(next),
                    None => {
                        self.scheduler.active = None;
                        break;
                    }
                },
            }
        }

        if let Some(reason) = self.scheduler.stop_reason_now() {
            self.finish(reason);
            return false;
        }

        if !self.scheduler.advance_clock() {
            // A member skipped by the scan may still be waiting.
            return match self.scheduler.select_waiting(None) {
                Some(tx) => {
                    self.scheduler.activate(tx);
                    true
                }
                None => {
                    self.finish(StopReason::Exhausted);
                    false
                }
            };
        }
        debug!(clock = self.scheduler.clock, cec = self.scheduler.cec.len(), "clock advanced");

        if let Some(reason) = self.scheduler.stop_reason_now() {
            self.finish(reason);
            return false;
        }
        if let Some(tx) = self.scheduler.select_waiting(None) {
            self.scheduler.activate(tx);
        }
        true
    }

    fn finish(&mut self, reason: StopReason) {
        self.scheduler.state = RunState::Finished;
        self.scheduler.stop_reason = Some(reason);
        self.scheduler.active = None;
        info!(
            clock = self.scheduler.clock,
            reason = ?reason,
            termination_count = self.scheduler.termination_count,
            transactions = self.scheduler.transaction_counter,
            faults = self.faults.len(),
            "simulation finished"
        );
    }

    /// Summary of the current (or last) run.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            stop_reason: self.scheduler.stop_reason.unwrap_or(StopReason::Exhausted),
            clock: self.scheduler.clock,
            termination_count: self.scheduler.termination_count,
            transactions_created: self.scheduler.transaction_counter,
            faults: self.faults.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Transaction movement
    // -----------------------------------------------------------------------

    fn admit(&mut self, generate: BlockId) {
        let result = process::admit(&mut self.context(), generate);
        match result {
            Ok(Some(tx)) => {
                if self.config.trace_all
                    && let Some(t) = self.scheduler.transaction_mut(tx)
                {
                    t.trace_enabled = true;
                }
            }
            Ok(None) => {
                debug!(block = self.blocks[generate.index()].number, "generation limit reached");
            }
            Err(fault) => self.record_fault(Some(generate), None, fault),
        }
    }

    /// Move the active transaction through blocks until it stops being
    /// active.
    fn move_transaction(&mut self, tx: TransactionId) {
        loop {
            let Some(t) = self.scheduler.transaction(tx) else {
                return;
            };
            if !t.is_active() {
                return;
            }
            let current = t.current_block;
            let next = t.next_block;

            if let Some(cur) = current
                && !t.successor_scheduled
                && self.blocks[cur.index()].kind.is_generate()
            {
                let clock = self.scheduler.clock;
                if let Some(t) = self.scheduler.transaction_mut(tx) {
                    t.successor_scheduled = true;
                    t.mark_time = clock;
                }
                self.admit(cur);
            }

            let Some(next) = next else {
                self.discard(tx, current, ProcessFault::EndOfChain);
                return;
            };

            let outcome = process::process(&mut self.context(), next, tx);
            match outcome {
                Ok(BlockOutcome::Processed) => self.enter_block(tx, next),
                Ok(BlockOutcome::EntryRefused) => {
                    trace!(
                        transaction = self.transaction_number(tx),
                        block = self.blocks[next.index()].number,
                        "entry refused"
                    );
                    return;
                }
                Err(fault) => {
                    self.discard(tx, Some(next), fault);
                    return;
                }
            }
        }
    }

    /// Bookkeeping shared by every admitted entry.
    fn enter_block(&mut self, tx: TransactionId, id: BlockId) {
        let clock = self.scheduler.clock;
        let block = &self.blocks[id.index()];
        let Some(t) = self.scheduler.transactions.get_mut(tx) else {
            return;
        };
        if let Some(prev) = t.current_block {
            self.counters[prev.index()].residents.remove(&tx);
        }
        t.current_block = Some(id);
        t.next_block = block.next;
        let counters = &mut self.counters[id.index()];
        counters.residents.insert(tx);
        counters.entry_count += 1;

        if t.trace_enabled || self.config.trace_all {
            info!(
                clock,
                transaction = t.number(),
                block = block.number,
                "{}",
                block.text
            );
        } else {
            trace!(clock, transaction = t.number(), block = block.number, "entered");
        }

        if t.is_terminated() {
            let number = t.number();
            counters.residents.remove(&tx);
            self.scheduler.transactions.remove(tx);
            if self.scheduler.active == Some(tx) {
                self.scheduler.active = None;
            }
            let held = self.registry.abandon(tx);
            if !held.is_empty() {
                warn!(
                    clock,
                    transaction = number,
                    facilities = ?held.facilities,
                    queues = ?held.queues,
                    "transaction terminated while holding resources"
                );
            }
        }
    }

    /// Log a fault and drop the transaction from every chain and the arena.
    fn discard(&mut self, tx: TransactionId, block: Option<BlockId>, fault: ProcessFault) {
        let number = self.transaction_number(tx);
        self.record_fault(block, number, fault);
        self.scheduler.fec.remove(tx);
        self.scheduler.cec.remove(tx);
        self.registry.forget(tx);
        if let Some(t) = self.scheduler.transactions.remove(tx)
            && let Some(cur) = t.current_block
        {
            self.counters[cur.index()].residents.remove(&tx);
        }
        if self.scheduler.active == Some(tx) {
            self.scheduler.active = None;
        }
    }

    fn record_fault(&mut self, block: Option<BlockId>, transaction: Option<u64>, fault: ProcessFault) {
        let block_number = block.map(|id| self.blocks[id.index()].number);
        warn!(
            clock = self.scheduler.clock,
            block = ?block_number,
            transaction = ?transaction,
            %fault,
            "process fault"
        );
        self.faults.push(FaultRecord {
            clock: self.scheduler.clock,
            block,
            block_number,
            transaction,
            fault,
        });
    }

    fn transaction_number(&self, tx: TransactionId) -> Option<u64> {
        self.scheduler.transaction(tx).map(Transaction::number)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> SimTime {
        self.scheduler.clock
    }

    pub fn termination_count(&self) -> i64 {
        self.scheduler.termination_count
    }

    /// Transactions created in the current run.
    pub fn transaction_counter(&self) -> u64 {
        self.scheduler.transaction_counter
    }

    pub fn state(&self) -> RunState {
        self.scheduler.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.scheduler.stop_reason
    }

    pub fn active(&self) -> Option<TransactionId> {
        self.scheduler.active
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    pub fn block_id(&self, label: &str) -> Option<BlockId> {
        self.labels.get(label).copied()
    }

    pub fn counters(&self, id: BlockId) -> Option<&BlockCounters> {
        self.counters.get(id.index())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn faults(&self) -> &[FaultRecord] {
        &self.faults
    }

    /// At least one transaction was discarded by a fault.
    pub fn is_degraded(&self) -> bool {
        !self.faults.is_empty()
    }

    pub fn transaction(&self, tx: TransactionId) -> Option<&Transaction> {
        self.scheduler.transaction(tx)
    }

    /// Live transactions, in arena order.
    pub fn transactions(&self) -> impl Iterator<Item = (TransactionId, &Transaction)> {
        self.scheduler.transactions.iter()
    }

    /// Future events chain in order.
    pub fn fec(&self) -> impl Iterator<Item = (SimTime, TransactionId)> + '_ {
        self.scheduler.fec.iter()
    }

    /// Current events chain in order.
    pub fn cec(&self) -> impl Iterator<Item = TransactionId> + '_ {
        self.scheduler.cec.iter()
    }
}
