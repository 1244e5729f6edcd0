use std::fmt;

/// Semantic type of a mapped field.
///
/// Drivers pick a storage type per semantic type; the result mapper coerces
/// whatever the driver returns back into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    String,
    Integer,
    Decimal,
    Timestamp,
    Boolean,
    Blob,
}

impl Type {
    pub fn is_integer(self) -> bool {
        matches!(self, Type::Integer)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Type::String => "string",
            Type::Integer => "integer",
            Type::Decimal => "decimal",
            Type::Timestamp => "timestamp",
            Type::Boolean => "boolean",
            Type::Blob => "blob",
        })
    }
}
