use jdorm_core::{
    err,
    schema::{EntityDescriptor, FieldMapping},
    stmt::{Type, Value, ValueRecord},
    Error, Result,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Coerce every column of a row to its field's semantic type.
pub(crate) fn record(descriptor: &EntityDescriptor, row: ValueRecord) -> Result<ValueRecord> {
    if row.len() != descriptor.fields.len() {
        return Err(err!(
            "`{}` row has {} columns; expected {}",
            descriptor.name,
            row.len(),
            descriptor.fields.len()
        ));
    }

    row.into_iter()
        .zip(&descriptor.fields)
        .map(|(value, field)| {
            value_for(value, field).map_err(|e| {
                e.context(err!("column `{}.{}`", descriptor.table, field.column))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(ValueRecord::from_vec)
}

/// Coerce one column value for `field`.
pub(crate) fn value_for(value: Value, field: &FieldMapping) -> Result<Value> {
    if value.is_null() {
        return if field.nullable {
            Ok(Value::Null)
        } else {
            Err(Error::type_coercion(&value, field.ty))
        };
    }

    value_to(value, field.ty)
}

/// Drivers report values in their storage representation; map them back.
pub(crate) fn value_to(value: Value, ty: Type) -> Result<Value> {
    let fail = |value: &Value| Error::type_coercion(value, ty);

    Ok(match (ty, value) {
        (Type::String, Value::String(v)) => Value::String(v),
        (Type::Integer, Value::I64(v)) => Value::I64(v),
        (Type::Decimal, Value::Decimal(v)) => Value::Decimal(v),
        (Type::Decimal, Value::I64(v)) => Value::Decimal(Decimal::from(v)),
        (Type::Decimal, Value::String(v)) => match Decimal::from_str(&v) {
            Ok(v) => Value::Decimal(v),
            Err(_) => return Err(fail(&Value::String(v))),
        },
        (Type::Timestamp, Value::Timestamp(v)) => Value::Timestamp(v),
        (Type::Timestamp, Value::String(v)) => match DateTime::parse_from_rfc3339(&v) {
            Ok(v) => Value::Timestamp(v.with_timezone(&Utc)),
            Err(_) => return Err(fail(&Value::String(v))),
        },
        (Type::Timestamp, Value::I64(v)) => match DateTime::<Utc>::from_timestamp(v, 0) {
            Some(v) => Value::Timestamp(v),
            None => return Err(fail(&Value::I64(v))),
        },
        (Type::Boolean, Value::Bool(v)) => Value::Bool(v),
        (Type::Boolean, Value::I64(0)) => Value::Bool(false),
        (Type::Boolean, Value::I64(1)) => Value::Bool(true),
        (Type::Blob, Value::Bytes(v)) => Value::Bytes(v),
        (_, value) => return Err(fail(&value)),
    })
}
