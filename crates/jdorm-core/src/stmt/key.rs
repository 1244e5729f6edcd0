use super::Value;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// Primary-key (or foreign-key) value of an entity, one value per key field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Vec<Value>);

impl Key {
    pub fn from_vec(values: Vec<Value>) -> Key {
        Key(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A key with any null component identifies no row.
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Value::is_null)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(value, f)?;
        }
        f.write_str(")")
    }
}

impl From<Vec<Value>> for Key {
    fn from(values: Vec<Value>) -> Key {
        Key(values)
    }
}

macro_rules! impl_from_scalar {
    ( $( $ty:ty ),* ) => {
        $(
            impl From<$ty> for Key {
                fn from(src: $ty) -> Key {
                    Key(vec![Value::from(src)])
                }
            }
        )*
    };
}

impl_from_scalar!(
    Value,
    bool,
    i64,
    i32,
    u32,
    String,
    &String,
    &str,
    Decimal,
    DateTime<Utc>,
    Vec<u8>
);

impl<A, B> From<(A, B)> for Key
where
    Value: From<A> + From<B>,
{
    fn from((a, b): (A, B)) -> Key {
        Key(vec![Value::from(a), Value::from(b)])
    }
}

impl<A, B, C> From<(A, B, C)> for Key
where
    Value: From<A> + From<B> + From<C>,
{
    fn from((a, b, c): (A, B, C)) -> Key {
        Key(vec![Value::from(a), Value::from(b), Value::from(c)])
    }
}
