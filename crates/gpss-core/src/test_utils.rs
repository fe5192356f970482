//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::block::{AssignMode, AssignTarget, BlockKind};
use crate::engine::Simulation;
use crate::model::{Model, ModelBuilder};
use crate::operand::Operand;
use crate::sim::SimConfig;

// ===========================================================================
// Operands
// ===========================================================================

pub fn lit(n: i64) -> Operand {
    Operand::Literal(n)
}

pub fn name(n: &str) -> Operand {
    Operand::Name(n.to_string())
}

// ===========================================================================
// Blocks
// ===========================================================================

pub fn generate(mean: i64, spread: i64) -> BlockKind {
    BlockKind::Generate {
        mean: lit(mean),
        spread: lit(spread),
        offset: lit(0),
        limit: lit(0),
        priority: lit(0),
    }
}

pub fn generate_limited(mean: i64, limit: i64) -> BlockKind {
    BlockKind::Generate {
        mean: lit(mean),
        spread: lit(0),
        offset: lit(0),
        limit: lit(limit),
        priority: lit(0),
    }
}

pub fn advance(mean: i64, spread: i64) -> BlockKind {
    BlockKind::Advance {
        mean: lit(mean),
        spread: lit(spread),
    }
}

pub fn terminate(amount: i64) -> BlockKind {
    BlockKind::Terminate { amount: lit(amount) }
}

pub fn seize(facility: &str) -> BlockKind {
    BlockKind::Seize {
        facility: name(facility),
    }
}

pub fn release(facility: &str) -> BlockKind {
    BlockKind::Release {
        facility: name(facility),
    }
}

pub fn enter(storage: &str, units: i64) -> BlockKind {
    BlockKind::Enter {
        storage: name(storage),
        units: lit(units),
    }
}

pub fn leave(storage: &str, units: i64) -> BlockKind {
    BlockKind::Leave {
        storage: name(storage),
        units: lit(units),
    }
}

pub fn queue(q: &str) -> BlockKind {
    BlockKind::Queue {
        queue: name(q),
        units: lit(1),
    }
}

pub fn depart(q: &str) -> BlockKind {
    BlockKind::Depart {
        queue: name(q),
        units: lit(1),
    }
}

pub fn priority(value: i64) -> BlockKind {
    BlockKind::Priority { value: lit(value) }
}

pub fn assign(parameter: &str, value: Operand) -> BlockKind {
    BlockKind::Assign {
        target: AssignTarget {
            name: parameter.to_string(),
            mode: AssignMode::Replace,
        },
        value,
        function: None,
    }
}

pub fn assign_add(parameter: &str, value: Operand) -> BlockKind {
    BlockKind::Assign {
        target: AssignTarget {
            name: parameter.to_string(),
            mode: AssignMode::Add,
        },
        value,
        function: None,
    }
}

pub fn storage(capacity: i64) -> BlockKind {
    BlockKind::Storage { capacity }
}

// ===========================================================================
// Models and simulations
// ===========================================================================

pub fn config(termination_count: i64) -> SimConfig {
    SimConfig {
        termination_count,
        ..SimConfig::default()
    }
}

/// Build a model from labelled statements.
pub fn build_model(statements: &[(Option<&str>, BlockKind)]) -> Model {
    let mut b = ModelBuilder::new();
    for (label, kind) in statements {
        b.block(*label, kind.clone());
    }
    b.build().expect("test model should build")
}

/// A simulation over an unlabelled block chain.
pub fn simulation(blocks: &[BlockKind], config: SimConfig) -> Simulation {
    let statements: Vec<_> = blocks.iter().map(|k| (None, k.clone())).collect();
    Simulation::new(build_model(&statements), config)
}

pub fn simulation_with(statements: &[(Option<&str>, BlockKind)], config: SimConfig) -> Simulation {
    Simulation::new(build_model(statements), config)
}
