mod belongs_to;
pub use belongs_to::BelongsTo;

mod cell;
pub(crate) use cell::{Binding, Lazy};

mod has_many;
pub use has_many::HasMany;

mod has_one;
pub use has_one::HasOne;

use crate::{entity::AnyInstance, Entity};

use jdorm_core::{schema::RelationKind, Result};
use std::sync::Arc;

/// A field holding the instances on the other side of a relationship.
pub trait Relation: Clone + Default + Send + Sync + 'static {
    type Target: Entity;

    const KIND: RelationKind;

    #[doc(hidden)]
    fn slot(&self) -> Arc<dyn RelationSlot>;
}

/// Session-facing side of a relation field.
#[doc(hidden)]
pub trait RelationSlot: Send + Sync {
    /// Attach the field to a session so it can load on first access. Has no
    /// effect once the field is loaded.
    fn bind(&self, binding: Binding);

    /// Store loaded targets.
    fn resolve(&self, targets: Vec<AnyInstance>) -> Result<()>;

    fn is_resolved(&self) -> bool;
}
