use super::Error;
use crate::stmt::{Type, Value};

/// A column value could not be coerced to the field's semantic type.
#[derive(Debug)]
pub(super) struct TypeCoercionError {
    found: Option<Type>,
    expected: Type,
}

impl std::error::Error for TypeCoercionError {}

impl core::fmt::Display for TypeCoercionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.found {
            Some(found) => write!(f, "cannot coerce {} to {}", found, self.expected),
            None => write!(f, "cannot coerce NULL to {}", self.expected),
        }
    }
}

impl Error {
    pub fn type_coercion(value: &Value, expected: Type) -> Error {
        Error::from(super::ErrorKind::TypeCoercion(TypeCoercionError {
            found: value.infer_ty(),
            expected,
        }))
    }

    pub fn is_type_coercion(&self) -> bool {
        self.any(|kind| matches!(kind, super::ErrorKind::TypeCoercion(_)))
    }
}
