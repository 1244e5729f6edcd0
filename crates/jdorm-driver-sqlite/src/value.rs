use chrono::SecondsFormat;
use jdorm_core::stmt::Value as CoreValue;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rust_decimal::Decimal;

/// A core value on its way into or out of SQLite.
///
/// Decoding is untyped: the result mapper coerces text back into decimals
/// and timestamps.
#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    pub fn from_sql(value: ValueRef<'_>) -> Self {
        let core_value = match value {
            ValueRef::Null => CoreValue::Null,
            ValueRef::Integer(value) => CoreValue::I64(value),
            ValueRef::Real(value) => match Decimal::try_from(value) {
                Ok(value) => CoreValue::Decimal(value),
                Err(_) => CoreValue::String(value.to_string()),
            },
            ValueRef::Text(value) => match std::str::from_utf8(value) {
                Ok(value) => CoreValue::String(value.to_string()),
                Err(_) => CoreValue::Bytes(value.to_vec()),
            },
            ValueRef::Blob(value) => CoreValue::Bytes(value.to_vec()),
        };

        Value(core_value)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match &self.0 {
            CoreValue::Null => ToSqlOutput::Owned(SqlValue::Null),
            CoreValue::Bool(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            CoreValue::I64(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            CoreValue::Decimal(v) => ToSqlOutput::Owned(SqlValue::Text(v.to_string())),
            CoreValue::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            CoreValue::Timestamp(v) => {
                ToSqlOutput::Owned(SqlValue::Text(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            }
            CoreValue::Bytes(v) => ToSqlOutput::Borrowed(ValueRef::Blob(&v[..])),
        })
    }
}
