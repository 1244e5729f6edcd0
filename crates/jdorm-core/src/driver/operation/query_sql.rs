use super::Operation;

use crate::stmt::Value;

#[derive(Debug, Clone)]
pub struct QuerySql {
    /// SQL text with dialect-specific positional placeholders
    pub sql: String,

    /// Parameter values, in placeholder order
    pub params: Vec<Value>,

    /// When true the statement produces rows (`SELECT`, `RETURNING`);
    /// otherwise the driver reports the affected-row count.
    pub returning: bool,
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
