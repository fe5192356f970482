use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Identifies a live transaction in the simulation arena.
    pub struct TransactionId;
}

/// Index of a block in the model's block arena. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies a facility in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacilityId(pub u32);

/// Identifies a storage in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId(pub u32);

/// Identifies a queue in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(pub u32);

/// Identifies a function in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// Assembly set a transaction belongs to. A freshly generated transaction
/// forms a set of its own, numbered after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssemblySet(pub u64);

/// How a model refers to an entity: by symbolic name or by number.
///
/// `CAJA` and `1` are distinct entities even if a model uses both.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityName {
    Named(String),
    Numbered(u32),
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityName::Named(name) => f.write_str(name),
            EntityName::Numbered(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for EntityName {
    fn from(name: &str) -> Self {
        EntityName::Named(name.to_string())
    }
}

impl From<u32> for EntityName {
    fn from(number: u32) -> Self {
        EntityName::Numbered(number)
    }
}
