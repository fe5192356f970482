//! End-of-run report for the GPSS engine.
//!
//! [`Report::capture`] copies everything a report needs out of a
//! [`Simulation`] through its query API. The copy is independent of the
//! engine: it can be printed in the classic GPSS layout with
//! [`Report::render_text`] or exported with [`Report::to_json`].
//!
//! Statistics are computed in [`Fixed64`](gpss_core::fixed::Fixed64) by the
//! kernel and converted to `f64` here, for display only.

use gpss_core::engine::Simulation;
use gpss_core::fixed::{SimTime, fixed64_to_f64};
use gpss_core::sim::StopReason;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Report lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockLine {
    pub number: u32,
    pub label: Option<String>,
    pub operation: &'static str,
    pub entry_count: u64,
    pub current_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilityLine {
    pub name: String,
    pub entries: u64,
    pub utilization: f64,
    pub average_time: f64,
    /// Number of the owning transaction.
    pub owner: Option<u64>,
    pub pending: usize,
    pub delayed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageLine {
    pub name: String,
    pub capacity: i64,
    pub remaining: i64,
    pub in_use: i64,
    pub max: i64,
    pub entries: u64,
    pub average_content: f64,
    pub utilization: f64,
    pub average_time: f64,
    pub delayed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueLine {
    pub name: String,
    pub max: i64,
    pub content: i64,
    pub entries: u64,
    pub zero_entries: u64,
    pub average_content: f64,
    pub average_time: f64,
    pub average_time_nonzero: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultLine {
    pub clock: SimTime,
    /// Number of the block that faulted.
    pub block: Option<u32>,
    pub transaction: Option<u64>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Snapshot of a run for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub clock: SimTime,
    pub stop_reason: Option<StopReason>,
    pub termination_count: i64,
    pub transactions_created: u64,
    /// At least one transaction was discarded by a fault.
    pub degraded: bool,
    pub blocks: Vec<BlockLine>,
    pub facilities: Vec<FacilityLine>,
    pub storages: Vec<StorageLine>,
    pub queues: Vec<QueueLine>,
    pub faults: Vec<FaultLine>,
}

impl Report {
    pub fn capture(sim: &Simulation) -> Self {
        let blocks = sim
            .block_snapshots()
            .into_iter()
            .map(|b| BlockLine {
                number: b.number,
                label: b.label,
                operation: b.operation,
                entry_count: b.entry_count,
                current_count: b.current_count,
            })
            .collect();

        let facilities = sim
            .facility_snapshots()
            .into_iter()
            .map(|f| FacilityLine {
                name: f.name,
                entries: f.entry_count,
                utilization: fixed64_to_f64(f.utilization),
                average_time: fixed64_to_f64(f.average_holding_time),
                owner: f.owner,
                pending: f.pending_count,
                delayed: f.delay_count,
            })
            .collect();

        let storages = sim
            .storage_snapshots()
            .into_iter()
            .map(|s| StorageLine {
                name: s.name,
                capacity: s.capacity,
                remaining: s.free_units,
                in_use: s.in_use,
                max: s.peak_in_use,
                entries: s.entry_count,
                average_content: fixed64_to_f64(s.average_content),
                utilization: fixed64_to_f64(s.utilization),
                average_time: fixed64_to_f64(s.average_holding_time),
                delayed: s.delay_count,
            })
            .collect();

        let queues = sim
            .queue_snapshots()
            .into_iter()
            .map(|q| QueueLine {
                name: q.name,
                max: q.peak_count,
                content: q.current_count,
                entries: q.entry_count,
                zero_entries: q.zero_entry_count,
                average_content: fixed64_to_f64(q.average_content),
                average_time: fixed64_to_f64(q.average_residence),
                average_time_nonzero: fixed64_to_f64(q.average_residence_nonzero),
            })
            .collect();

        let faults = sim
            .faults()
            .iter()
            .map(|f| FaultLine {
                clock: f.clock,
                block: f.block_number,
                transaction: f.transaction,
                message: f.fault.to_string(),
            })
            .collect();

        Self {
            clock: sim.clock(),
            stop_reason: sim.stop_reason(),
            termination_count: sim.termination_count(),
            transactions_created: sim.transaction_counter(),
            degraded: sim.is_degraded(),
            blocks,
            facilities,
            storages,
            queues,
            faults,
        }
    }

    /// The report in the classic GPSS layout.
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn stop_reason_text(reason: Option<StopReason>) -> &'static str {
    match reason {
        Some(StopReason::TerminationCount) => "TERMINATION COUNT REACHED",
        Some(StopReason::TargetTime) => "TARGET TIME REACHED",
        Some(StopReason::Exhausted) => "NO EVENTS LEFT",
        None => "NOT FINISHED",
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "              GPSS REPORT")?;
        writeln!(f)?;
        writeln!(
            f,
            "   {:>10} {:>12} {:>7} {:>11} {:>9} {:>7}",
            "END TIME", "TRANSACTIONS", "BLOCKS", "FACILITIES", "STORAGES", "QUEUES"
        )?;
        writeln!(
            f,
            "   {:>10} {:>12} {:>7} {:>11} {:>9} {:>7}",
            self.clock,
            self.transactions_created,
            self.blocks.len(),
            self.facilities.len(),
            self.storages.len(),
            self.queues.len()
        )?;
        writeln!(f, "   STOP: {}", stop_reason_text(self.stop_reason))?;
        writeln!(f, "   TERMINATION COUNT LEFT: {}", self.termination_count)?;

        writeln!(f)?;
        writeln!(
            f,
            "   {:<12} {:>5}  {:<10} {:>12} {:>14}",
            "LABEL", "LOC", "BLOCK TYPE", "ENTRY COUNT", "CURRENT COUNT"
        )?;
        for b in &self.blocks {
            writeln!(
                f,
                "   {:<12} {:>5}  {:<10} {:>12} {:>14}",
                b.label.as_deref().unwrap_or(""),
                b.number,
                b.operation,
                b.entry_count,
                b.current_count
            )?;
        }

        if !self.facilities.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "   {:<12} {:>8} {:>7} {:>10} {:>6} {:>5} {:>6}",
                "FACILITY", "ENTRIES", "UTIL.", "AVE. TIME", "OWNER", "PEND", "DELAY"
            )?;
            for fac in &self.facilities {
                writeln!(
                    f,
                    "   {:<12} {:>8} {:>7.3} {:>10.3} {:>6} {:>5} {:>6}",
                    fac.name,
                    fac.entries,
                    fac.utilization,
                    fac.average_time,
                    or_dash(fac.owner),
                    fac.pending,
                    fac.delayed
                )?;
            }
        }

        if !self.storages.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "   {:<12} {:>6} {:>6} {:>6} {:>8} {:>8} {:>7} {:>10} {:>6}",
                "STORAGE", "CAP.", "REM.", "MAX.", "ENTRIES", "AVE.C.", "UTIL.", "AVE. TIME", "DELAY"
            )?;
            for s in &self.storages {
                writeln!(
                    f,
                    "   {:<12} {:>6} {:>6} {:>6} {:>8} {:>8.3} {:>7.3} {:>10.3} {:>6}",
                    s.name,
                    s.capacity,
                    s.remaining,
                    s.max,
                    s.entries,
                    s.average_content,
                    s.utilization,
                    s.average_time,
                    s.delayed
                )?;
            }
        }

        if !self.queues.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "   {:<12} {:>5} {:>6} {:>7} {:>9} {:>10} {:>10} {:>10}",
                "QUEUE", "MAX", "CONT.", "ENTRY", "ENTRY(0)", "AVE.CONT.", "AVE.TIME", "AVE.(-0)"
            )?;
            for q in &self.queues {
                writeln!(
                    f,
                    "   {:<12} {:>5} {:>6} {:>7} {:>9} {:>10.3} {:>10.3} {:>10.3}",
                    q.name,
                    q.max,
                    q.content,
                    q.entries,
                    q.zero_entries,
                    q.average_content,
                    q.average_time,
                    q.average_time_nonzero
                )?;
            }
        }

        if self.degraded {
            writeln!(f)?;
            writeln!(
                f,
                "   DEGRADED: {} transaction(s) discarded by faults",
                self.faults.len()
            )?;
            for fault in &self.faults {
                writeln!(
                    f,
                    "   AT {:>8}  BLOCK {:>4}  XN {:>6}  {}",
                    fault.clock,
                    or_dash(fault.block),
                    or_dash(fault.transaction),
                    fault.message
                )?;
            }
        }
        Ok(())
    }
}
