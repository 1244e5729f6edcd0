use super::{cell, Lazy, Relation, RelationSlot};
use crate::{Entity, Instance};

use jdorm_core::{schema::RelationKind, Result};
use std::{fmt, sync::Arc};

/// The inverse side of a one-to-one relationship.
pub struct HasOne<T> {
    cell: Arc<Lazy<Option<Instance<T>>>>,
}

impl<T: Entity> HasOne<T> {
    pub async fn get(&self) -> Result<Option<Instance<T>>> {
        self.cell.get(T::NAME).await
    }

    pub fn loaded(&self) -> Option<Option<Instance<T>>> {
        self.cell.peek()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_resolved()
    }
}

impl<T: Entity> Relation for HasOne<T> {
    type Target = T;

    const KIND: RelationKind = RelationKind::OneToOne;

    fn slot(&self) -> Arc<dyn RelationSlot> {
        cell::slot(&self.cell)
    }
}

impl<T: Entity> Default for HasOne<T> {
    fn default() -> Self {
        HasOne {
            cell: Arc::new(Lazy::new()),
        }
    }
}

impl<T> Clone for HasOne<T> {
    fn clone(&self) -> Self {
        HasOne {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Entity> fmt::Debug for HasOne<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HasOne<{}>({:?})", T::NAME, self.cell)
    }
}
