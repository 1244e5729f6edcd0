#[derive(Debug)]
pub struct Capability {
    /// SQL dialect spoken by the database.
    pub dialect: Dialect,

    /// Supports `INSERT ... RETURNING`.
    pub returning: bool,

    /// In-flight statements can be interrupted from another task.
    pub cancellation: bool,

    /// Most bind parameters one statement may carry.
    pub max_params: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Postgresql,
    Mysql,
}

impl Capability {
    /// SQLite capabilities.
    pub const SQLITE: Self = Self {
        dialect: Dialect::Sqlite,
        returning: true,
        cancellation: true,
        max_params: 32_766,
    };

    /// PostgreSQL capabilities
    pub const POSTGRESQL: Self = Self {
        dialect: Dialect::Postgresql,
        max_params: 65_535,
        ..Self::SQLITE
    };

    /// MySQL capabilities
    pub const MYSQL: Self = Self {
        dialect: Dialect::Mysql,
        returning: false,
        max_params: 65_535,
        ..Self::SQLITE
    };
}
