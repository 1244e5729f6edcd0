#[macro_use]
mod fmt;
use fmt::ToSql;

mod create_table;

mod delim;
use delim::Comma;

mod flavor;
use flavor::Flavor;

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};
use params::Bind;

mod statement;

mod ty;

use crate::{StatementKind, Template};

/// Serialize entity statements to SQL templates for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    /// The database flavor handles the differences between SQL dialects and
    /// supported features.
    flavor: Flavor,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to record parameter slots
    params: &'a mut T,
}

impl Serializer {
    fn serialize(
        &self,
        kind: StatementKind,
        entity: &str,
        returning: Vec<usize>,
        body: impl FnOnce(&mut Formatter<'_, Vec<crate::Slot>>),
    ) -> Template {
        let mut sql = String::new();
        let mut slots = vec![];

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut sql,
            params: &mut slots,
        };

        body(&mut fmt);

        sql.push(';');

        Template {
            kind,
            entity: entity.to_string(),
            sql,
            slots,
            returning,
        }
    }
}
