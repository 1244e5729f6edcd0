use jdorm_core::{
    driver::operation::QuerySql,
    err,
    stmt::{Value, ValueRecord},
    Result,
};

/// Precomputed SQL text plus a recipe for its parameter list.
///
/// Templates are built once per entity (and once per criteria shape for
/// selects) and bound to concrete values for every execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub kind: StatementKind,

    /// Entity the template was built for.
    pub entity: String,

    pub sql: String,

    /// One slot per placeholder, in placeholder order.
    pub slots: Vec<Slot>,

    /// Field indices of the columns the statement returns, in column order.
    pub returning: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
    CreateTable,
}

/// Where a placeholder's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A field of the entity record, by declared index.
    Field(usize),

    /// An explicit parameter, by position.
    Param(usize),
}

impl Template {
    pub fn returns_rows(&self) -> bool {
        self.kind == StatementKind::Select || !self.returning.is_empty()
    }

    /// Resolve every slot to a value.
    pub fn bind(&self, record: Option<&ValueRecord>, params: &[Value]) -> Result<Vec<Value>> {
        self.slots
            .iter()
            .map(|slot| match *slot {
                Slot::Field(index) => record
                    .and_then(|record| record.get(index))
                    .cloned()
                    .ok_or_else(|| {
                        err!(
                            "{:?} statement for `{}` needs field #{index}, which the record does not have",
                            self.kind,
                            self.entity
                        )
                    }),
                Slot::Param(index) => params.get(index).cloned().ok_or_else(|| {
                    err!(
                        "{:?} statement for `{}` needs parameter #{index}, only {} given",
                        self.kind,
                        self.entity,
                        params.len()
                    )
                }),
            })
            .collect()
    }

    /// Bind and wrap as a driver operation.
    pub fn query(&self, record: Option<&ValueRecord>, params: &[Value]) -> Result<QuerySql> {
        Ok(QuerySql {
            sql: self.sql.clone(),
            params: self.bind(record, params)?,
            returning: self.returns_rows(),
        })
    }
}
