use super::RelationSlot;
use crate::{entity::AnyInstance, session::SessionShared, Entity, Instance};

use jdorm_core::{stmt::Key, Error, Result};
use parking_lot::Mutex;
use std::{
    any::TypeId,
    fmt,
    sync::{Arc, Weak},
};

/// Where a lazy relation loads from.
#[derive(Clone)]
pub struct Binding {
    pub(crate) session: Weak<SessionShared>,

    /// Entity that declares the relation.
    pub(crate) entity: TypeId,

    /// Index of the relation in the declaring entity's descriptor.
    pub(crate) relation: usize,

    /// Values of the relation's source fields on the owning instance.
    pub(crate) key: Key,
}

impl Binding {
    async fn load(&self) -> Result<Vec<AnyInstance>> {
        let session = self.session.upgrade().ok_or_else(Error::session_closed)?;
        session.load_relation(self).await
    }
}

/// Loaded value of a relation field.
pub(crate) trait FromTargets: Clone + Send + Sync + 'static {
    fn from_targets(targets: Vec<AnyInstance>) -> Result<Self>;
}

impl<T: Entity> FromTargets for Option<Instance<T>> {
    fn from_targets(targets: Vec<AnyInstance>) -> Result<Self> {
        targets.into_iter().next().map(Instance::from_any).transpose()
    }
}

impl<T: Entity> FromTargets for Vec<Instance<T>> {
    fn from_targets(targets: Vec<AnyInstance>) -> Result<Self> {
        targets.into_iter().map(Instance::from_any).collect()
    }
}

enum State<V> {
    Detached,
    Unresolved(Binding),
    Resolved(V),
}

/// Relation contents, loaded at most once.
pub(crate) struct Lazy<V> {
    state: Mutex<State<V>>,
}

impl<V: FromTargets> Lazy<V> {
    pub(crate) fn new() -> Lazy<V> {
        Lazy {
            state: Mutex::new(State::Detached),
        }
    }

    pub(crate) fn resolved(value: V) -> Lazy<V> {
        Lazy {
            state: Mutex::new(State::Resolved(value)),
        }
    }

    pub(crate) async fn get(&self, target: &'static str) -> Result<V> {
        let binding = match &*self.state.lock() {
            State::Resolved(value) => return Ok(value.clone()),
            State::Unresolved(binding) => binding.clone(),
            State::Detached => return Err(Error::relation_not_loaded(target)),
        };

        let value = V::from_targets(binding.load().await?)?;

        let mut state = self.state.lock();
        if let State::Resolved(existing) = &*state {
            return Ok(existing.clone());
        }
        *state = State::Resolved(value.clone());
        Ok(value)
    }

    pub(crate) fn peek(&self) -> Option<V> {
        match &*self.state.lock() {
            State::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<V: FromTargets> RelationSlot for Lazy<V> {
    fn bind(&self, binding: Binding) {
        let mut state = self.state.lock();
        if !matches!(*state, State::Resolved(_)) {
            *state = State::Unresolved(binding);
        }
    }

    fn resolve(&self, targets: Vec<AnyInstance>) -> Result<()> {
        let value = V::from_targets(targets)?;
        *self.state.lock() = State::Resolved(value);
        Ok(())
    }

    fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), State::Resolved(_))
    }
}

impl<V> fmt::Debug for Lazy<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.try_lock().as_deref() {
            Some(State::Detached) => "detached",
            Some(State::Unresolved(_)) => "unloaded",
            Some(State::Resolved(_)) => "loaded",
            None => "locked",
        };
        f.write_str(state)
    }
}

pub(crate) fn slot<V: FromTargets>(cell: &Arc<Lazy<V>>) -> Arc<dyn RelationSlot> {
    cell.clone()
}
