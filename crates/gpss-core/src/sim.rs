//! Run configuration and run state types.

use crate::fixed::SimTime;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How a run is started and when it stops.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed of every random family.
    pub seed: u64,
    /// Initial termination counter. The run stops once TERMINATE blocks
    /// have counted it down to zero.
    pub termination_count: i64,
    /// Stop once the clock passes this time. `None` runs until the
    /// termination counter or the future events chain is exhausted.
    pub target_time: Option<SimTime>,
    /// Trace every transaction, not only those that pass a TRACE block.
    pub trace_all: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_6955,
            termination_count: 1,
            target_time: None,
            trace_all: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StopReason {
    /// The termination counter reached zero.
    TerminationCount,
    /// The clock passed the target time.
    TargetTime,
    /// Nothing was left to schedule.
    Exhausted,
}

/// Result of [`Simulation::simulate`](crate::engine::Simulation::simulate).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub clock: SimTime,
    pub termination_count: i64,
    pub transactions_created: u64,
    pub faults: usize,
}

impl RunSummary {
    /// At least one transaction was discarded by a fault.
    pub fn is_degraded(&self) -> bool {
        self.faults > 0
    }
}
