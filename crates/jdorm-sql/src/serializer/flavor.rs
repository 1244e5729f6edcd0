use super::Serializer;

use jdorm_core::driver::{Capability, Dialect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    Postgresql,
    Sqlite,
    Mysql,
}

impl Serializer {
    pub fn sqlite() -> Serializer {
        Serializer {
            flavor: Flavor::Sqlite,
        }
    }

    pub fn postgresql() -> Serializer {
        Serializer {
            flavor: Flavor::Postgresql,
        }
    }

    pub fn mysql() -> Serializer {
        Serializer {
            flavor: Flavor::Mysql,
        }
    }

    /// The serializer matching a driver's dialect.
    pub fn for_capability(capability: &Capability) -> Serializer {
        match capability.dialect {
            Dialect::Sqlite => Serializer::sqlite(),
            Dialect::Postgresql => Serializer::postgresql(),
            Dialect::Mysql => Serializer::mysql(),
        }
    }

    /// Whether `INSERT ... RETURNING` can report generated keys.
    pub(crate) fn supports_returning(&self) -> bool {
        !matches!(self.flavor, Flavor::Mysql)
    }
}
