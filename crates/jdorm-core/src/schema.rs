//! Mapping metadata.
//!
//! [`Mapping`] is what an entity type declares about itself. The registry
//! validates it into an [`EntityDescriptor`], which is immutable from then on.

mod descriptor;
pub use descriptor::{EntityDescriptor, FieldMapping, ForeignKeyField, RelationMapping};

mod mapping;
pub use mapping::{FieldDecl, LoadingPolicy, Mapping, RelationDecl, RelationKind};
