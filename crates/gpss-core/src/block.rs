//! Blocks: the statements of a model.
//!
//! Transactional blocks form one linked chain that transactions move along.
//! Declarations (STORAGE, FUNCTION) define entities and are never entered.
//! Static definitions live in [`Block`]; what a run accumulates per block
//! lives in [`BlockCounters`], kept by the simulation alongside.

use crate::function::FunctionKind;
use crate::id::{BlockId, TransactionId};
use crate::operand::Operand;
use std::collections::BTreeSet;

/// What an ASSIGN does with the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AssignMode {
    Replace,
    Add,
    Subtract,
}

/// Parameter written by an ASSIGN (`NAME`, `NAME+` or `NAME-`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssignTarget {
    pub name: String,
    pub mode: AssignMode,
}

impl AssignTarget {
    pub fn apply(&self, current: i64, value: i64) -> i64 {
        match self.mode {
            AssignMode::Replace => value,
            AssignMode::Add => current.saturating_add(value),
            AssignMode::Subtract => current.saturating_sub(value),
        }
    }
}

/// Block kinds with their operands. Omitted operands are filled with their
/// defaults when the block is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Generate {
        mean: Operand,
        spread: Operand,
        offset: Operand,
        /// Admissions allowed; 0 means unlimited.
        limit: Operand,
        priority: Operand,
    },
    Advance {
        mean: Operand,
        spread: Operand,
    },
    Terminate {
        amount: Operand,
    },
    Seize {
        facility: Operand,
    },
    Release {
        facility: Operand,
    },
    Enter {
        storage: Operand,
        units: Operand,
    },
    Leave {
        storage: Operand,
        units: Operand,
    },
    Queue {
        queue: Operand,
        units: Operand,
    },
    Depart {
        queue: Operand,
        units: Operand,
    },
    Priority {
        value: Operand,
    },
    Assign {
        target: AssignTarget,
        value: Operand,
        /// Function whose value multiplies `value`.
        function: Option<Operand>,
    },
    Trace,
    Untrace,
    /// STORAGE declaration; the entity name is the block label.
    Storage {
        capacity: i64,
    },
    /// FUNCTION declaration; the entity name is the block label.
    Function {
        argument: Operand,
        kind: FunctionKind,
        points: Vec<(i64, i64)>,
    },
}

impl BlockKind {
    /// Operation keyword as written in model text.
    pub fn operation(&self) -> &'static str {
        match self {
            BlockKind::Generate { .. } => "GENERATE",
            BlockKind::Advance { .. } => "ADVANCE",
            BlockKind::Terminate { .. } => "TERMINATE",
            BlockKind::Seize { .. } => "SEIZE",
            BlockKind::Release { .. } => "RELEASE",
            BlockKind::Enter { .. } => "ENTER",
            BlockKind::Leave { .. } => "LEAVE",
            BlockKind::Queue { .. } => "QUEUE",
            BlockKind::Depart { .. } => "DEPART",
            BlockKind::Priority { .. } => "PRIORITY",
            BlockKind::Assign { .. } => "ASSIGN",
            BlockKind::Trace => "TRACE",
            BlockKind::Untrace => "UNTRACE",
            BlockKind::Storage { .. } => "STORAGE",
            BlockKind::Function { .. } => "FUNCTION",
        }
    }

    /// Whether transactions pass through this block.
    pub fn is_executable(&self) -> bool {
        !matches!(self, BlockKind::Storage { .. } | BlockKind::Function { .. })
    }

    pub fn is_generate(&self) -> bool {
        matches!(self, BlockKind::Generate { .. })
    }
}

/// A model statement.
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BlockId,
    /// Source line, 1-based.
    pub line: usize,
    pub label: Option<String>,
    /// Ordinal in the model, 1-based.
    pub number: u32,
    /// Source text, for reports and traces.
    pub text: String,
    pub kind: BlockKind,
    pub(crate) previous: Option<BlockId>,
    pub(crate) next: Option<BlockId>,
}

impl Block {
    pub fn executable(&self) -> bool {
        self.kind.is_executable()
    }

    pub fn previous(&self) -> Option<BlockId> {
        self.previous
    }

    pub fn next(&self) -> Option<BlockId> {
        self.next
    }
}

/// Per-block run state.
#[derive(Debug, Clone, Default)]
pub struct BlockCounters {
    /// Transactions that entered (for GENERATE: transactions created).
    pub entry_count: u64,
    /// GENERATE only: admissions made, checked against the limit.
    pub admissions: u64,
    /// Transactions whose current block this is.
    pub residents: BTreeSet<TransactionId>,
}

impl BlockCounters {
    pub fn current_count(&self) -> usize {
        self.residents.len()
    }

    pub(crate) fn reset(&mut self) {
        *self = BlockCounters::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_are_not_executable() {
        assert!(!BlockKind::Storage { capacity: 1 }.is_executable());
        assert!(BlockKind::Trace.is_executable());
        assert!(
            BlockKind::Seize {
                facility: Operand::Name("CAJA".into())
            }
            .is_executable()
        );
    }

    #[test]
    fn assign_modes() {
        let t = |mode| AssignTarget {
            name: "X".into(),
            mode,
        };
        assert_eq!(t(AssignMode::Replace).apply(5, 2), 2);
        assert_eq!(t(AssignMode::Add).apply(5, 2), 7);
        assert_eq!(t(AssignMode::Subtract).apply(5, 2), 3);
        assert_eq!(t(AssignMode::Add).apply(i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn operation_names() {
        assert_eq!(BlockKind::Untrace.operation(), "UNTRACE");
        assert_eq!(
            BlockKind::Terminate {
                amount: Operand::Literal(1)
            }
            .operation(),
            "TERMINATE"
        );
    }
}
