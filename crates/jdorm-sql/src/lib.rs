//! Statement builder: turns entity descriptors and query criteria into
//! parameterized SQL for a specific dialect.

pub mod cache;
pub use cache::{TemplateCache, TemplateKey};

pub mod lower;
pub use lower::{FilterShape, Shape};

pub mod serializer;
pub use serializer::{Params, Placeholder, Serializer};

pub mod template;
pub use template::{Slot, StatementKind, Template};

use jdorm_core::{
    driver::operation::QuerySql,
    schema::EntityDescriptor,
    stmt::{Criteria, Key, ValueRecord},
    Result,
};

/// A statement to build for one entity.
#[derive(Debug, Clone, Copy)]
pub enum Statement<'a> {
    /// Insert a row from a full record.
    Insert(&'a ValueRecord),

    /// Update the non-key columns of the row identified by the record's key.
    Update(&'a ValueRecord),

    /// Delete the row with the given key.
    Delete(&'a Key),

    /// Select rows matching the criteria.
    Select(&'a Criteria),
}

impl Serializer {
    /// Build SQL text and ordered parameter values for `stmt`.
    ///
    /// Returns `Ok(None)` for an update of an entity with no non-key columns.
    pub fn build(&self, descriptor: &EntityDescriptor, stmt: Statement<'_>) -> Result<Option<QuerySql>> {
        match stmt {
            Statement::Insert(record) => self.insert(descriptor)?.query(Some(record), &[]).map(Some),
            Statement::Update(record) => self
                .update(descriptor)
                .map(|template| template.query(Some(record), &[]))
                .transpose(),
            Statement::Delete(key) => self.delete(descriptor).query(None, key.values()).map(Some),
            Statement::Select(criteria) => {
                let (shape, params) = lower::lower(descriptor, criteria)?;
                self.select(descriptor, &shape).query(None, &params).map(Some)
            }
        }
    }
}
