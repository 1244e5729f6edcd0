use super::{cell, Lazy, Relation, RelationSlot};
use crate::{Entity, Instance};

use jdorm_core::{schema::RelationKind, Result};
use std::{fmt, sync::Arc};

/// The owning side of a many-to-one (or one-to-one) relationship: this
/// entity stores the foreign key.
pub struct BelongsTo<T> {
    cell: Arc<Lazy<Option<Instance<T>>>>,
}

impl<T: Entity> BelongsTo<T> {
    /// A relation already pointing at `target`.
    pub fn new(target: Option<Instance<T>>) -> BelongsTo<T> {
        BelongsTo {
            cell: Arc::new(Lazy::resolved(target)),
        }
    }

    /// The referenced instance, loading it through the session on first
    /// access. `None` when the foreign key is NULL or dangling.
    pub async fn get(&self) -> Result<Option<Instance<T>>> {
        self.cell.get(T::NAME).await
    }

    /// The referenced instance if it is already loaded.
    pub fn loaded(&self) -> Option<Option<Instance<T>>> {
        self.cell.peek()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_resolved()
    }
}

impl<T: Entity> Relation for BelongsTo<T> {
    type Target = T;

    const KIND: RelationKind = RelationKind::ManyToOne;

    fn slot(&self) -> Arc<dyn RelationSlot> {
        cell::slot(&self.cell)
    }
}

impl<T: Entity> Default for BelongsTo<T> {
    fn default() -> Self {
        BelongsTo {
            cell: Arc::new(Lazy::new()),
        }
    }
}

impl<T> Clone for BelongsTo<T> {
    fn clone(&self) -> Self {
        BelongsTo {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Entity> fmt::Debug for BelongsTo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BelongsTo<{}>({:?})", T::NAME, self.cell)
    }
}
