pub mod cursor;
pub use cursor::Cursor;

pub mod db;
pub use db::{Config, Db};

mod engine;

mod entity;
pub use entity::{Entity, Instance};

mod primitive;
pub use primitive::Primitive;

mod registry;
pub use registry::Registry;

pub mod relation;
pub use relation::{BelongsTo, HasMany, HasOne};

pub mod session;
pub use session::{CancelHandle, Session, Status};

pub use jdorm_core::{
    driver,
    schema::{self, LoadingPolicy},
    stmt::{self, Criteria, Key, Value},
    Error, Result,
};

pub use jdorm_macros::Entity;

#[doc(hidden)]
pub mod codegen_support {
    pub use crate::{
        relation::{Relation, RelationSlot},
        Entity, Error, Primitive, Result,
    };
    pub use jdorm_core::{
        schema::{FieldDecl, LoadingPolicy, Mapping, RelationDecl},
        stmt::{Value, ValueRecord},
    };
    pub use std::{default::Default, option::Option, sync::Arc};
}
