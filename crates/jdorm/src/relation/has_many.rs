use super::{cell, Lazy, Relation, RelationSlot};
use crate::{Entity, Instance};

use jdorm_core::{schema::RelationKind, Result};
use std::{fmt, sync::Arc};

/// The inverse side of a one-to-many relationship.
pub struct HasMany<T> {
    cell: Arc<Lazy<Vec<Instance<T>>>>,
}

impl<T: Entity> HasMany<T> {
    /// Related instances, loaded through the session on first access.
    pub async fn get(&self) -> Result<Vec<Instance<T>>> {
        self.cell.get(T::NAME).await
    }

    pub fn loaded(&self) -> Option<Vec<Instance<T>>> {
        self.cell.peek()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_resolved()
    }
}

impl<T: Entity> Relation for HasMany<T> {
    type Target = T;

    const KIND: RelationKind = RelationKind::OneToMany;

    fn slot(&self) -> Arc<dyn RelationSlot> {
        cell::slot(&self.cell)
    }
}

impl<T: Entity> Default for HasMany<T> {
    fn default() -> Self {
        HasMany {
            cell: Arc::new(Lazy::new()),
        }
    }
}

impl<T> Clone for HasMany<T> {
    fn clone(&self) -> Self {
        HasMany {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Entity> fmt::Debug for HasMany<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HasMany<{}>({:?})", T::NAME, self.cell)
    }
}
