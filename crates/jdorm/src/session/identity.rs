use crate::entity::AnyInstance;

use indexmap::IndexMap;
use jdorm_core::stmt::{Key, ValueRecord};
use std::{any::TypeId, sync::Arc};

/// Per-session map from `(entity type, primary key)` to the single managed
/// instance for that row.
#[derive(Default)]
pub(crate) struct IdentityMap {
    entries: IndexMap<(TypeId, Key), Entry>,
}

pub(crate) struct Entry {
    pub(crate) instance: AnyInstance,
    pub(crate) state: EntryState,

    /// Column values as last read from or written to the database. `None`
    /// forces an update at the next flush.
    pub(crate) snapshot: Option<ValueRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryState {
    /// Staged for insert.
    New,

    /// Present in the database.
    Persisted,

    /// Staged for delete.
    Deleted,
}

impl IdentityMap {
    pub(crate) fn get(&self, entity: TypeId, key: &Key) -> Option<&Entry> {
        self.entries.get(&(entity, key.clone()))
    }

    pub(crate) fn get_mut(&mut self, entity: TypeId, key: &Key) -> Option<&mut Entry> {
        self.entries.get_mut(&(entity, key.clone()))
    }

    /// Live instance for a key; entries staged for delete are hidden.
    pub(crate) fn live(&self, entity: TypeId, key: &Key) -> Option<&AnyInstance> {
        self.get(entity, key)
            .filter(|entry| entry.state != EntryState::Deleted)
            .map(|entry| &entry.instance)
    }

    pub(crate) fn insert(&mut self, entity: TypeId, key: Key, entry: Entry) {
        self.entries.insert((entity, key), entry);
    }

    pub(crate) fn remove(&mut self, entity: TypeId, key: &Key) -> Option<Entry> {
        self.entries.shift_remove(&(entity, key.clone()))
    }

    /// Key under which `instance` is managed.
    pub(crate) fn find(&self, instance: &AnyInstance) -> Option<(TypeId, Key)> {
        self.entries
            .iter()
            .find(|(_, entry)| Arc::ptr_eq(&entry.instance, instance))
            .map(|(id, _)| id.clone())
    }

    /// Persisted entries, in the order they became managed.
    pub(crate) fn persisted(&self) -> impl Iterator<Item = (&(TypeId, Key), &Entry)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.state == EntryState::Persisted)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
