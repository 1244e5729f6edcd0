use jdorm_core::{
    err,
    stmt::{Type, Value},
    Error, Result,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A Rust type stored in a single column.
pub trait Primitive: Sized {
    /// Semantic type of the column.
    const TYPE: Type;

    const NULLABLE: bool = false;

    /// Convert from a value already coerced to [`Primitive::TYPE`].
    fn load(value: Value) -> Result<Self>;

    fn to_value(&self) -> Value;
}

impl Primitive for String {
    const TYPE: Type = Type::String;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Primitive for i64 {
    const TYPE: Type = Type::Integer;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::I64(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::I64(*self)
    }
}

impl Primitive for i32 {
    const TYPE: Type = Type::Integer;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::I64(v) => i32::try_from(v).map_err(|_| {
                Error::type_coercion(&value, Self::TYPE)
                    .context(err!("{v} is out of range for i32"))
            }),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::I64((*self).into())
    }
}

impl Primitive for bool {
    const TYPE: Type = Type::Boolean;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Primitive for Decimal {
    const TYPE: Type = Type::Decimal;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl Primitive for DateTime<Utc> {
    const TYPE: Type = Type::Timestamp;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl Primitive for Vec<u8> {
    const TYPE: Type = Type::Blob;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            _ => Err(Error::type_coercion(&value, Self::TYPE)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }
}

impl<T: Primitive> Primitive for Option<T> {
    const TYPE: Type = T::TYPE;
    const NULLABLE: bool = true;

    fn load(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::load(value).map(Some),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Some(value) => value.to_value(),
            None => Value::Null,
        }
    }
}
