use super::Flavor;

use jdorm_core::stmt::Type;

impl Flavor {
    /// Column storage type for a semantic type.
    pub(super) fn storage_type(self, ty: Type, key: bool) -> &'static str {
        match (self, ty) {
            (Flavor::Sqlite, Type::String) => "TEXT",
            (Flavor::Sqlite, Type::Integer | Type::Boolean) => "INTEGER",
            // Stored as text so the exact representation survives.
            (Flavor::Sqlite, Type::Decimal | Type::Timestamp) => "TEXT",
            (Flavor::Sqlite, Type::Blob) => "BLOB",

            (Flavor::Postgresql, Type::String) => "TEXT",
            (Flavor::Postgresql, Type::Integer) => "BIGINT",
            (Flavor::Postgresql, Type::Decimal) => "NUMERIC",
            (Flavor::Postgresql, Type::Timestamp) => "TIMESTAMPTZ",
            (Flavor::Postgresql, Type::Boolean) => "BOOLEAN",
            (Flavor::Postgresql, Type::Blob) => "BYTEA",

            // MySQL cannot index unbounded TEXT columns.
            (Flavor::Mysql, Type::String) if key => "VARCHAR(191)",
            (Flavor::Mysql, Type::String) => "TEXT",
            (Flavor::Mysql, Type::Integer) => "BIGINT",
            (Flavor::Mysql, Type::Decimal) => "DECIMAL(38, 10)",
            (Flavor::Mysql, Type::Timestamp) => "DATETIME(6)",
            (Flavor::Mysql, Type::Boolean) => "BOOLEAN",
            (Flavor::Mysql, Type::Blob) => "BLOB",
        }
    }
}
