//! Entity registry: every facility, storage, queue and function of a model.
//!
//! Storages and functions are declared up front by the model. Facilities and
//! queues come into existence the first time a block refers to them, and so
//! does a storage that was never declared (with
//! [`DEFAULT_STORAGE_CAPACITY`]). Read-only lookups never create anything.

use crate::facility::Facility;
use crate::function::Function;
use crate::id::{EntityName, FacilityId, FunctionId, QueueId, StorageId, TransactionId};
use crate::queue::Queue;
use crate::storage::{DEFAULT_STORAGE_CAPACITY, Storage, StorageError};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} {name} is declared more than once")]
    DuplicateEntity { kind: &'static str, name: EntityName },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    facilities: Vec<Facility>,
    facility_ids: HashMap<EntityName, FacilityId>,
    storages: Vec<Storage>,
    storage_ids: HashMap<EntityName, StorageId>,
    queues: Vec<Queue>,
    queue_ids: HashMap<EntityName, QueueId>,
    functions: Vec<Function>,
    function_ids: HashMap<EntityName, FunctionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    pub fn declare_storage(
        &mut self,
        name: EntityName,
        capacity: i64,
    ) -> Result<StorageId, RegistryError> {
        if self.storage_ids.contains_key(&name) {
            return Err(RegistryError::DuplicateEntity {
                kind: "storage",
                name,
            });
        }
        let storage = Storage::new(name.clone(), capacity)?;
        let id = StorageId(self.storages.len() as u32);
        self.storages.push(storage);
        self.storage_ids.insert(name, id);
        Ok(id)
    }

    pub fn declare_function(&mut self, function: Function) -> Result<FunctionId, RegistryError> {
        let name = function.name().clone();
        if self.function_ids.contains_key(&name) {
            return Err(RegistryError::DuplicateEntity {
                kind: "function",
                name,
            });
        }
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(function);
        self.function_ids.insert(name, id);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Lazy lookups
    // -----------------------------------------------------------------------

    /// The named facility, created idle on first use.
    pub fn facility_mut(&mut self, name: &EntityName) -> &mut Facility {
        let id = match self.facility_ids.get(name) {
            Some(id) => *id,
            None => {
                let id = FacilityId(self.facilities.len() as u32);
                self.facilities.push(Facility::new(name.clone()));
                self.facility_ids.insert(name.clone(), id);
                debug!(facility = %name, "facility created");
                id
            }
        };
        &mut self.facilities[id.0 as usize]
    }

    /// The named storage. An undeclared storage is created with the default
    /// capacity.
    pub fn storage_mut(&mut self, name: &EntityName) -> &mut Storage {
        let id = match self.storage_ids.get(name) {
            Some(id) => *id,
            None => {
                let id = StorageId(self.storages.len() as u32);
                self.storages.push(Storage::undeclared(name.clone()));
                self.storage_ids.insert(name.clone(), id);
                warn!(
                    storage = %name,
                    capacity = DEFAULT_STORAGE_CAPACITY,
                    "storage used without a declaration"
                );
                id
            }
        };
        &mut self.storages[id.0 as usize]
    }

    /// The named queue, created empty on first use.
    pub fn queue_mut(&mut self, name: &EntityName) -> &mut Queue {
        let id = match self.queue_ids.get(name) {
            Some(id) => *id,
            None => {
                let id = QueueId(self.queues.len() as u32);
                self.queues.push(Queue::new(name.clone()));
                self.queue_ids.insert(name.clone(), id);
                debug!(queue = %name, "queue created");
                id
            }
        };
        &mut self.queues[id.0 as usize]
    }

    // -----------------------------------------------------------------------
    // Read-only lookups
    // -----------------------------------------------------------------------

    pub fn facility(&self, name: &EntityName) -> Option<&Facility> {
        self.facility_ids
            .get(name)
            .map(|id| &self.facilities[id.0 as usize])
    }

    pub fn storage(&self, name: &EntityName) -> Option<&Storage> {
        self.storage_ids
            .get(name)
            .map(|id| &self.storages[id.0 as usize])
    }

    pub fn queue(&self, name: &EntityName) -> Option<&Queue> {
        self.queue_ids.get(name).map(|id| &self.queues[id.0 as usize])
    }

    pub fn function(&self, name: &EntityName) -> Option<&Function> {
        self.function_ids
            .get(name)
            .map(|id| &self.functions[id.0 as usize])
    }

    pub fn facility_id(&self, name: &EntityName) -> Option<FacilityId> {
        self.facility_ids.get(name).copied()
    }

    pub fn storage_id(&self, name: &EntityName) -> Option<StorageId> {
        self.storage_ids.get(name).copied()
    }

    pub fn queue_id(&self, name: &EntityName) -> Option<QueueId> {
        self.queue_ids.get(name).copied()
    }

    /// Facilities in creation order.
    pub fn facilities(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.iter()
    }

    /// Storages in declaration/creation order.
    pub fn storages(&self) -> impl Iterator<Item = &Storage> {
        self.storages.iter()
    }

    pub fn queues(&self) -> impl Iterator<Item = &Queue> {
        self.queues.iter()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    // -----------------------------------------------------------------------
    // Run lifecycle
    // -----------------------------------------------------------------------

    /// Clear statistics and waiting lists. Entities stay registered.
    pub(crate) fn reset(&mut self) {
        self.facilities.iter_mut().for_each(Facility::reset);
        self.storages.iter_mut().for_each(Storage::reset);
        self.queues.iter_mut().for_each(Queue::reset);
    }

    /// Drop `tx` from every delay and pending chain and close its open
    /// queue visits.
    pub(crate) fn forget(&mut self, tx: TransactionId) {
        for facility in &mut self.facilities {
            facility.forget(tx);
        }
        for storage in &mut self.storages {
            storage.delay_chain.remove(tx);
        }
        self.abandon(tx);
    }

    /// Entities a leaving transaction still holds. Its open queue visits are
    /// dropped; the content they added stays counted. Facilities it owns
    /// stay owned.
    pub(crate) fn abandon(&mut self, tx: TransactionId) -> Holdings {
        Holdings {
            facilities: self
                .facilities
                .iter()
                .filter(|f| f.owner() == Some(tx))
                .map(|f| f.name().clone())
                .collect(),
            queues: self
                .queues
                .iter_mut()
                .filter_map(|q| q.abandon(tx).then(|| q.name().clone()))
                .collect(),
        }
    }
}

/// Resources a transaction held when it left the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Holdings {
    pub facilities: Vec<EntityName>,
    pub queues: Vec<EntityName>,
}

impl Holdings {
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty() && self.queues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionKind;
    use crate::operand::Operand;

    #[test]
    fn facilities_are_created_lazily() {
        let mut reg = Registry::new();
        assert!(reg.facility(&"CAJA".into()).is_none());
        reg.facility_mut(&"CAJA".into());
        reg.facility_mut(&"CAJA".into());
        assert_eq!(reg.facility_count(), 1);
        assert_eq!(reg.facility_id(&"CAJA".into()), Some(FacilityId(0)));
    }

    #[test]
    fn numbered_and_named_entities_are_distinct() {
        let mut reg = Registry::new();
        reg.queue_mut(&EntityName::Numbered(1));
        reg.queue_mut(&"1X".into());
        assert_eq!(reg.queue_count(), 2);
    }

    #[test]
    fn declared_storage_keeps_capacity() {
        let mut reg = Registry::new();
        reg.declare_storage("SALON".into(), 10).unwrap();
        assert_eq!(reg.storage_mut(&"SALON".into()).capacity(), 10);
        assert_eq!(reg.storage_count(), 1);
    }

    #[test]
    fn undeclared_storage_gets_default_capacity() {
        let mut reg = Registry::new();
        let st = reg.storage_mut(&"PATIO".into());
        assert_eq!(st.capacity(), DEFAULT_STORAGE_CAPACITY);
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let mut reg = Registry::new();
        reg.declare_storage("SALON".into(), 10).unwrap();
        assert!(matches!(
            reg.declare_storage("SALON".into(), 5),
            Err(RegistryError::DuplicateEntity { kind: "storage", .. })
        ));

        let f = || {
            Function::new(
                "F".into(),
                Operand::Literal(0),
                FunctionKind::Discrete,
                vec![(1, 1)],
            )
            .unwrap()
        };
        reg.declare_function(f()).unwrap();
        assert!(reg.declare_function(f()).is_err());
    }

    #[test]
    fn invalid_capacity_is_a_storage_error() {
        let mut reg = Registry::new();
        assert_eq!(
            reg.declare_storage("X".into(), -3),
            Err(RegistryError::Storage(StorageError::InvalidCapacity(-3)))
        );
    }

    #[test]
    fn reset_keeps_entities_and_clears_state() {
        let mut reg = Registry::new();
        reg.declare_storage("SALON".into(), 10).unwrap();
        reg.storage_mut(&"SALON".into()).enter(4, 0).unwrap();
        reg.queue_mut(&"COLA".into());
        reg.reset();
        assert_eq!(reg.storage(&"SALON".into()).unwrap().free_units(), 10);
        assert_eq!(reg.queue_count(), 1);
    }
}
