use crate::relation::RelationSlot;

use jdorm_core::{
    err,
    schema::Mapping,
    stmt::{Value, ValueRecord},
    Result,
};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::{any::Any, fmt, sync::Arc};

/// A type persisted as one row of one table.
///
/// Implemented by `#[derive(Entity)]`. Column-backed fields are exchanged as
/// a [`ValueRecord`] in the order they appear in [`Entity::mapping`].
pub trait Entity: Sized + Send + Sync + 'static {
    /// Entity name, unique within a registry.
    const NAME: &'static str;

    /// Declared mapping intent.
    fn mapping() -> Mapping;

    /// Current column values.
    fn to_record(&self) -> ValueRecord;

    /// Construct from column values already coerced to their semantic types.
    fn load(record: ValueRecord) -> Result<Self>;

    /// Overwrite one column-backed field, e.g. with a database-generated key.
    fn assign(&mut self, field: usize, value: Value) -> Result<()>;

    /// Relation field at `index` in declared relation order.
    #[doc(hidden)]
    fn relation(&self, index: usize) -> Option<Arc<dyn RelationSlot>> {
        let _ = index;
        None
    }
}

/// Type-erased managed instance, as stored in a session's identity map.
pub(crate) type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Shared handle to an entity managed by a session.
///
/// Every lookup of the same row within one session returns a handle to the
/// same instance; use [`Instance::ptr_eq`] to check identity.
pub struct Instance<T> {
    inner: Arc<RwLock<T>>,
}

impl<T: Entity> Instance<T> {
    pub(crate) fn new(value: T) -> Instance<T> {
        Instance {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Mutable access. Changes to a persisted instance are written at the
    /// next flush.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Whether both handles point at the same managed instance.
    pub fn ptr_eq(a: &Instance<T>, b: &Instance<T>) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub(crate) fn into_any(self) -> AnyInstance {
        self.inner
    }

    pub(crate) fn from_any(any: AnyInstance) -> Result<Instance<T>> {
        match any.downcast::<RwLock<T>>() {
            Ok(inner) => Ok(Instance { inner }),
            Err(_) => Err(err!("managed instance is not a `{}`", T::NAME)),
        }
    }
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Instance {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(value) => fmt::Debug::fmt(&*value, f),
            None => f.write_str("Instance(<locked>)"),
        }
    }
}

/// Per-type operations the session needs on erased instances.
#[derive(Clone, Copy)]
pub(crate) struct VTable {
    pub(crate) load: fn(ValueRecord) -> Result<AnyInstance>,
    pub(crate) record: fn(&AnyInstance) -> Result<ValueRecord>,
    pub(crate) assign: fn(&AnyInstance, usize, Value) -> Result<()>,
    pub(crate) relation: fn(&AnyInstance, usize) -> Result<Option<Arc<dyn RelationSlot>>>,
}

impl VTable {
    pub(crate) fn of<T: Entity>() -> VTable {
        VTable {
            load: load::<T>,
            record: record::<T>,
            assign: assign::<T>,
            relation: relation::<T>,
        }
    }
}

fn downcast<T: Entity>(any: &AnyInstance) -> Result<&RwLock<T>> {
    any.downcast_ref::<RwLock<T>>()
        .ok_or_else(|| err!("managed instance is not a `{}`", T::NAME))
}

fn load<T: Entity>(record: ValueRecord) -> Result<AnyInstance> {
    Ok(Instance::new(T::load(record)?).into_any())
}

fn record<T: Entity>(any: &AnyInstance) -> Result<ValueRecord> {
    Ok(downcast::<T>(any)?.read().to_record())
}

fn assign<T: Entity>(any: &AnyInstance, field: usize, value: Value) -> Result<()> {
    downcast::<T>(any)?.write().assign(field, value)
}

fn relation<T: Entity>(any: &AnyInstance, index: usize) -> Result<Option<Arc<dyn RelationSlot>>> {
    Ok(downcast::<T>(any)?.read().relation(index))
}
